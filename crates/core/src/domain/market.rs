use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar. Providers only emit bars with finite, positive prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub symbol: String,
    pub price: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub volume_ratio: f64,
    pub high_52w: Option<f64>,
    pub low_52w: Option<f64>,
    pub market_cap: Option<f64>,
    pub currency: String,
    pub observed_at: DateTime<Utc>,
}

impl PriceObservation {
    pub fn has_valid_price(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub symbol: String,
    pub price: f64,
    pub rsi: f64,
    pub support: f64,
    pub resistance: f64,
    pub atr: f64,
    pub volume_spike: f64,
    pub ma20: f64,
    pub trend: Trend,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub stop_pct: f64,
    pub target_pct: f64,
    pub signals: Vec<String>,
}

impl TechnicalSnapshot {
    /// Reward per unit of risk between entry and the stop/target levels.
    pub fn reward_risk(&self) -> f64 {
        let risk = self.entry - self.stop;
        if risk <= 0.0 {
            return 0.0;
        }
        (self.target - self.entry) / risk
    }
}
