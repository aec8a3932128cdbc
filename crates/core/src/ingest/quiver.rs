use crate::config::Settings;
use crate::domain::signal::Disclosure;
use crate::error::{Error, Result};
use crate::ingest::provider::{DisclosureProvider, JsonHttp};
use crate::ingest::types::RawDisclosure;
use chrono::{Duration, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};

const DEFAULT_URL: &str = "https://api.quiverquant.com/beta/live/congresstrading";

/// Congress trading disclosures from the Quiver live endpoint.
#[derive(Debug, Clone)]
pub struct QuiverDisclosureProvider {
    http: JsonHttp,
    url: String,
    api_key: Option<String>,
}

impl QuiverDisclosureProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let url = settings
            .disclosure_api_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_URL.to_string());

        Ok(Self {
            http: JsonHttp::from_settings(settings)?,
            url,
            api_key: settings.disclosure_api_key.clone(),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| Error::config(format!("invalid DISCLOSURE_API_KEY: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl DisclosureProvider for QuiverDisclosureProvider {
    fn provider_name(&self) -> &'static str {
        "quiver_congress"
    }

    async fn fetch_recent(&self, lookback_days: u32) -> Result<Vec<Disclosure>> {
        let raw: Vec<RawDisclosure> = self.http.get(&self.url, &[], self.headers()?).await?;
        let total = raw.len();
        let out = normalize(raw, Utc::now().date_naive(), lookback_days);
        tracing::info!(total, kept = out.len(), lookback_days, "fetched disclosures");
        Ok(out)
    }
}

/// Validates raw records, keeps the lookback window and sorts newest first.
pub fn normalize(raw: Vec<RawDisclosure>, today: NaiveDate, lookback_days: u32) -> Vec<Disclosure> {
    let cutoff = today - Duration::days(i64::from(lookback_days));

    let mut out: Vec<Disclosure> = raw
        .into_iter()
        .filter_map(|r| {
            let ticker = r
                .ticker
                .map(|t| t.trim().to_ascii_uppercase())
                .filter(|t| !t.is_empty() && t != "--" && t != "N/A")?;
            let transaction_date = r.transaction_date.as_deref().and_then(parse_date)?;
            if transaction_date < cutoff {
                return None;
            }

            Some(Disclosure {
                politician: r
                    .representative
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
                party: r.party.unwrap_or_default(),
                chamber: r.house.unwrap_or_default(),
                ticker,
                transaction: r.transaction.unwrap_or_default(),
                amount: r.range.unwrap_or_default(),
                transaction_date,
                report_date: r.report_date.as_deref().and_then(parse_date),
            })
        })
        .collect();

    out.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
    out
}

// Dates arrive as `YYYY-MM-DD`, sometimes with a time suffix.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_lookback_window_and_sorts_newest_first() {
        let raw: Vec<RawDisclosure> = serde_json::from_value(json!([
            {"Representative": "A. Member", "Party": "D", "House": "Representatives", "Ticker": "nvda",
             "Transaction": "Purchase", "Range": "$1,001 - $15,000", "TransactionDate": "2026-02-20", "ReportDate": "2026-03-01"},
            {"Representative": "B. Member", "Party": "R", "House": "Senate", "Ticker": "NVDA",
             "Transaction": "Sale (Full)", "Range": "$15,001 - $50,000", "TransactionDate": "2026-02-25T00:00:00"},
            {"Representative": "C. Member", "Ticker": "AAPL", "Transaction": "Purchase", "TransactionDate": "2025-10-01"},
            {"Representative": "D. Member", "Ticker": "--", "Transaction": "Purchase", "TransactionDate": "2026-02-26"},
            {"Representative": "E. Member", "Ticker": "MSFT", "Transaction": "Purchase", "TransactionDate": "not a date"}
        ]))
        .unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let out = normalize(raw, today, 90);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].politician, "B. Member");
        assert_eq!(out[1].ticker, "NVDA");
        assert!(out[1].is_buy());
        assert!(out[0].is_sell());
        assert_eq!(out[1].report_date, NaiveDate::from_ymd_opt(2026, 3, 1));
    }
}
