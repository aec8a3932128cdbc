use crate::domain::signal::{DisclosureSentiment, SentimentLabel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BriefingKind {
    Morning,
    Evening,
}

impl BriefingKind {
    pub const ALL: [BriefingKind; 2] = [BriefingKind::Morning, BriefingKind::Evening];

    pub fn as_str(self) -> &'static str {
        match self {
            BriefingKind::Morning => "morning",
            BriefingKind::Evening => "evening",
        }
    }
}

impl fmt::Display for BriefingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BriefingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(BriefingKind::Morning),
            "evening" => Ok(BriefingKind::Evening),
            other => Err(format!("unknown briefing kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Watch,
    Hold,
    Avoid,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Fixed score-to-action table. Morning favours entries, evening favours exits.
pub fn classify(score: i32, kind: BriefingKind) -> (Action, Confidence) {
    match (kind, score) {
        (BriefingKind::Morning, s) if s >= 2 => (Action::Buy, Confidence::High),
        (BriefingKind::Evening, s) if s >= 2 => (Action::Hold, Confidence::High),
        (BriefingKind::Morning, 1) => (Action::Watch, Confidence::Medium),
        (BriefingKind::Evening, 1) => (Action::Hold, Confidence::Medium),
        (_, 0) => (Action::Hold, Confidence::Low),
        (_, -1) => (Action::Watch, Confidence::Medium),
        (BriefingKind::Morning, _) => (Action::Avoid, Confidence::High),
        (BriefingKind::Evening, _) => (Action::Sell, Confidence::High),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub name: String,
    pub action: Action,
    pub confidence: Confidence,
    pub price: f64,
    pub change_percent: f64,
    pub reasons: Vec<String>,
    pub news_sentiment: SentimentLabel,
    pub disclosure_signal: Option<DisclosureSentiment>,
}
