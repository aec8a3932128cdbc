use crate::domain::recommendation::{BriefingKind, Recommendation};
use crate::domain::rocket::{RocketOutcome, RocketPick};
use crate::domain::signal::{DisclosureSentiment, SignalType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DISCLAIMER: &str = "This is not financial advice. The information is produced by \
automated analysis and must not be used as the sole basis for investment decisions. \
Always do your own research.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    PreOpen,
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Highlight {
    Signal {
        stock: String,
        signal: SignalType,
        reasons: Vec<String>,
    },
    Alert {
        stock: String,
        alert: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotableDisclosure {
    pub ticker: String,
    pub sentiment: DisclosureSentiment,
    pub description: String,
    pub total_trades: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Briefing {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: BriefingKind,
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub market_status: MarketStatus,
    pub summary: String,
    pub highlights: Vec<Highlight>,
    pub recommendations: Vec<Recommendation>,
    pub disclosure_notable: Vec<NotableDisclosure>,
    pub rocket_picks: Vec<RocketPick>,
    pub rocket_followup: Vec<RocketOutcome>,
    /// Non-fatal problems hit during the run (failed units, persistence errors).
    pub warnings: Vec<String>,
    pub disclaimer: String,
}
