use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Interesting,
    Warning,
    Neutral,
}

impl SignalType {
    pub fn from_score(score: i32) -> Self {
        if score >= 2 {
            SignalType::Interesting
        } else if score <= -2 {
            SignalType::Warning
        } else {
            SignalType::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub score: i32,
    #[serde(rename = "type")]
    pub kind: SignalType,
    pub reasons: Vec<String>,
}

impl Signal {
    pub fn neutral(reason: impl Into<String>) -> Self {
        Self {
            score: 0,
            kind: SignalType::Neutral,
            reasons: vec![reason.into()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Mixed,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSentiment {
    pub company: String,
    pub article_count: usize,
    pub overall: SentimentLabel,
    /// Average article score in [-1, 1].
    pub score: f64,
}

impl NewsSentiment {
    pub fn no_data(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            article_count: 0,
            overall: SentimentLabel::NoData,
            score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisclosureSentiment {
    Bullish,
    Bearish,
    Neutral,
}

/// A normalized disclosure record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disclosure {
    pub politician: String,
    pub party: String,
    pub chamber: String,
    pub ticker: String,
    pub transaction: String,
    pub amount: String,
    pub transaction_date: NaiveDate,
    pub report_date: Option<NaiveDate>,
}

impl Disclosure {
    pub fn is_buy(&self) -> bool {
        self.transaction.to_lowercase().contains("purchase")
    }

    pub fn is_sell(&self) -> bool {
        self.transaction.to_lowercase().contains("sale")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosureActivity {
    pub ticker: String,
    pub has_activity: bool,
    pub total_trades: usize,
    pub buys: usize,
    pub sells: usize,
    pub sentiment: DisclosureSentiment,
    pub description: String,
    pub politicians: Vec<String>,
    pub recent: Vec<Disclosure>,
}

impl DisclosureActivity {
    pub fn none(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            has_activity: false,
            total_trades: 0,
            buys: 0,
            sells: 0,
            sentiment: DisclosureSentiment::Neutral,
            description: String::new(),
            politicians: Vec::new(),
            recent: Vec::new(),
        }
    }

    pub fn is_net_buy(&self) -> bool {
        self.has_activity && self.buys > self.sells
    }
}
