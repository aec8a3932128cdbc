use crate::domain::analysis::InstrumentAnalysis;
use crate::domain::briefing::{Highlight, NotableDisclosure};
use crate::domain::recommendation::{classify, BriefingKind, Recommendation};
use crate::domain::round_to;
use crate::domain::signal::SignalType;
use chrono::NaiveDate;
use std::cmp::Reverse;

/// Home market first, then foreign. Within each, by score: descending in the
/// morning, ascending in the evening. Ties keep input order.
pub fn order_for(kind: BriefingKind, analyses: Vec<InstrumentAnalysis>) -> Vec<InstrumentAnalysis> {
    let (mut home, mut foreign): (Vec<_>, Vec<_>) =
        analyses.into_iter().partition(|a| a.instrument.is_home());

    for group in [&mut home, &mut foreign] {
        match kind {
            BriefingKind::Morning => group.sort_by_key(|a| Reverse(a.score())),
            BriefingKind::Evening => group.sort_by_key(|a| a.score()),
        }
    }

    home.extend(foreign);
    home
}

pub fn recommendations(kind: BriefingKind, analyses: &[InstrumentAnalysis]) -> Vec<Recommendation> {
    analyses
        .iter()
        .map(|a| {
            let (action, confidence) = classify(a.score(), kind);
            Recommendation {
                symbol: a.instrument.symbol.clone(),
                name: a.instrument.name.clone(),
                action,
                confidence,
                price: a.price(),
                change_percent: round_to(a.change_percent(), 2),
                reasons: a.signal.reasons.clone(),
                news_sentiment: a.news.overall,
                disclosure_signal: a.disclosure.has_activity.then_some(a.disclosure.sentiment),
            }
        })
        .collect()
}

pub fn highlights(analyses: &[InstrumentAnalysis]) -> Vec<Highlight> {
    let mut out = Vec::new();
    for a in analyses {
        if a.signal.kind != SignalType::Neutral {
            out.push(Highlight::Signal {
                stock: a.instrument.name.clone(),
                signal: a.signal.kind,
                reasons: a.signal.reasons.clone(),
            });
        }
        for flag in &a.unusual_activity {
            out.push(Highlight::Alert {
                stock: a.instrument.name.clone(),
                alert: flag.clone(),
            });
        }
    }
    out
}

pub fn notable_disclosures(analyses: &[InstrumentAnalysis]) -> Vec<NotableDisclosure> {
    analyses
        .iter()
        .filter(|a| a.disclosure.has_activity)
        .map(|a| NotableDisclosure {
            ticker: a.disclosure.ticker.clone(),
            sentiment: a.disclosure.sentiment,
            description: a.disclosure.description.clone(),
            total_trades: a.disclosure.total_trades,
        })
        .collect()
}

pub fn summary_text(kind: BriefingKind, date: NaiveDate, analyses: &[InstrumentAnalysis]) -> String {
    let positive = analyses.iter().filter(|a| a.score() > 0).count();
    let negative = analyses.iter().filter(|a| a.score() < 0).count();
    let neutral = analyses.len() - positive - negative;

    match kind {
        BriefingKind::Morning => format!(
            "Morning briefing {date}. Of {} tracked stocks, {positive} show positive signals, \
             {negative} negative and {neutral} neutral. The analysis is based on price data, \
             news sentiment and political trading disclosures.",
            analyses.len()
        ),
        BriefingKind::Evening => format!(
            "Evening briefing {date}. Today's trading shows {positive} stocks with positive \
             development, {negative} negative and {neutral} without a clear direction. \
             Recommendations for tomorrow follow below."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::{Instrument, Market};
    use crate::domain::recommendation::{Action, Confidence};
    use crate::domain::signal::{DisclosureSentiment, Signal};
    use chrono::{TimeZone, Utc};

    fn analysis(symbol: &str, market: Market, score: i32) -> InstrumentAnalysis {
        let instrument = Instrument {
            symbol: symbol.into(),
            name: format!("{symbol} name"),
            market,
            cap_size: None,
        };
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 15, 0).unwrap();
        let mut a = InstrumentAnalysis::placeholder(instrument, "x", now);
        a.error = None;
        a.signal = Signal {
            score,
            kind: SignalType::from_score(score),
            reasons: vec![format!("score {score}")],
        };
        a
    }

    fn symbols(v: &[InstrumentAnalysis]) -> Vec<&str> {
        v.iter().map(|a| a.symbol()).collect()
    }

    #[test]
    fn orders_home_first_by_kind() {
        let input = || {
            vec![
                analysis("NVDA", Market::Foreign, 2),
                analysis("A.ST", Market::Home, 0),
                analysis("B.ST", Market::Home, 3),
                analysis("C.ST", Market::Home, 0),
                analysis("MSFT", Market::Foreign, -1),
            ]
        };
        let morning = order_for(BriefingKind::Morning, input());
        assert_eq!(symbols(&morning), vec!["B.ST", "A.ST", "C.ST", "NVDA", "MSFT"]);

        let evening = order_for(BriefingKind::Evening, input());
        assert_eq!(symbols(&evening), vec!["A.ST", "C.ST", "B.ST", "MSFT", "NVDA"]);
    }

    #[test]
    fn recommendations_follow_table() {
        let mut a = analysis("B.ST", Market::Home, 2);
        a.disclosure.has_activity = true;
        a.disclosure.sentiment = DisclosureSentiment::Bullish;
        let recs = recommendations(BriefingKind::Morning, &[a, analysis("C.ST", Market::Home, -3)]);
        assert_eq!((recs[0].action, recs[0].confidence), (Action::Buy, Confidence::High));
        assert_eq!(recs[0].disclosure_signal, Some(DisclosureSentiment::Bullish));
        assert_eq!((recs[1].action, recs[1].confidence), (Action::Avoid, Confidence::High));
        assert_eq!(recs[1].disclosure_signal, None);
    }

    #[test]
    fn highlights_skip_neutral_and_include_alerts() {
        let mut quiet = analysis("A.ST", Market::Home, 1);
        quiet.unusual_activity = vec!["large move: +3.20%".into()];
        let out = highlights(&[quiet, analysis("B.ST", Market::Home, -2)]);
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], Highlight::Alert { alert, .. } if alert == "large move: +3.20%"));
        assert!(matches!(&out[1], Highlight::Signal { signal: SignalType::Warning, .. }));
    }

    #[test]
    fn summary_counts() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let v = vec![
            analysis("A.ST", Market::Home, 2),
            analysis("B.ST", Market::Home, -1),
            analysis("C.ST", Market::Home, 0),
            analysis("D.ST", Market::Home, 0),
        ];
        let s = summary_text(BriefingKind::Morning, date, &v);
        assert!(s.starts_with("Morning briefing 2026-03-02. Of 4 tracked stocks, 1 show positive"));
        assert!(s.contains("1 negative and 2 neutral"));
    }
}
