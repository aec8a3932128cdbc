use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub source: String,
}

// Yahoo Finance chart API (`/v8/finance/chart/{symbol}`).

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_low: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartQuote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

// JSON Feed 1.1 (https://www.jsonfeed.org/version/1.1/).

#[derive(Debug, Clone, Deserialize)]
pub struct JsonFeed {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<JsonFeedItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonFeedItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content_text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub date_published: Option<String>,
}

// Congress trading disclosures (Quiver Quantitative live feed).

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDisclosure {
    #[serde(default)]
    pub representative: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub house: Option<String>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub report_date: Option<String>,
}
