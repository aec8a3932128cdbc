use crate::domain::signal::{Disclosure, DisclosureActivity, DisclosureSentiment};
use std::collections::BTreeSet;

pub const LOOKBACK_DAYS: u32 = 90;
const MAX_RECENT: usize = 5;

/// Buy/sell activity for one ticker. A side dominates when it is more than
/// twice the other.
pub fn activity_for(ticker: &str, disclosures: &[Disclosure]) -> DisclosureActivity {
    let ticker = ticker.trim().to_ascii_uppercase();
    let mut trades: Vec<&Disclosure> = disclosures
        .iter()
        .filter(|d| d.ticker.eq_ignore_ascii_case(&ticker))
        .collect();
    if trades.is_empty() {
        return DisclosureActivity::none(ticker);
    }
    trades.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));

    let buys = trades.iter().filter(|d| d.is_buy()).count();
    let sells = trades.iter().filter(|d| d.is_sell()).count();
    let (sentiment, description) = if buys > sells * 2 {
        (
            DisclosureSentiment::Bullish,
            format!("politicians are buying more than selling ({buys} buys vs {sells} sells)"),
        )
    } else if sells > buys * 2 {
        (
            DisclosureSentiment::Bearish,
            format!("politicians are selling more than buying ({sells} sells vs {buys} buys)"),
        )
    } else {
        (
            DisclosureSentiment::Neutral,
            format!("mixed activity ({buys} buys, {sells} sells)"),
        )
    };

    let politicians: BTreeSet<String> = trades.iter().map(|d| d.politician.clone()).collect();

    DisclosureActivity {
        ticker,
        has_activity: true,
        total_trades: trades.len(),
        buys,
        sells,
        sentiment,
        description,
        politicians: politicians.into_iter().collect(),
        recent: trades.into_iter().take(MAX_RECENT).cloned().collect(),
    }
}
