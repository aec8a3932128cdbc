use crate::domain::instrument::Instrument;
use crate::domain::market::{PriceObservation, TechnicalSnapshot};
use crate::domain::signal::{DisclosureActivity, NewsSentiment, Signal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything one analysis unit learned about one instrument in one cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentAnalysis {
    pub instrument: Instrument,
    pub observation: Option<PriceObservation>,
    pub technical: Option<TechnicalSnapshot>,
    pub news: NewsSentiment,
    pub disclosure: DisclosureActivity,
    pub signal: Signal,
    pub unusual_activity: Vec<String>,
    pub headlines: Vec<String>,
    /// Set when the unit degraded to a placeholder or lost a data source.
    pub error: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl InstrumentAnalysis {
    /// Neutral stand-in for a unit that failed outright.
    pub fn placeholder(instrument: Instrument, error: impl Into<String>, now: DateTime<Utc>) -> Self {
        let error = error.into();
        let ticker = instrument.disclosure_ticker();
        let company = instrument.name.clone();
        Self {
            instrument,
            observation: None,
            technical: None,
            news: NewsSentiment::no_data(company),
            disclosure: DisclosureActivity::none(ticker),
            signal: Signal::neutral(format!("analysis failed: {error}")),
            unusual_activity: Vec::new(),
            headlines: Vec::new(),
            error: Some(error),
            analyzed_at: now,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.instrument.symbol
    }

    pub fn score(&self) -> i32 {
        self.signal.score
    }

    /// Current price, zero when no valid observation exists.
    pub fn price(&self) -> f64 {
        self.observation
            .as_ref()
            .filter(|o| o.has_valid_price())
            .map(|o| o.price)
            .unwrap_or(0.0)
    }

    pub fn change_percent(&self) -> f64 {
        self.observation
            .as_ref()
            .map(|o| o.change_percent)
            .unwrap_or(0.0)
    }

    pub fn volume_ratio(&self) -> f64 {
        self.observation
            .as_ref()
            .map(|o| o.volume_ratio)
            .unwrap_or(1.0)
    }
}
