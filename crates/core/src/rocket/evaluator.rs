use crate::domain::market::PriceObservation;
use crate::domain::rocket::{OutcomeStatus, RocketOutcome, RocketPick};
use crate::domain::round_to;
use std::collections::HashMap;

// Flat thresholds in percent, applied to every instrument alike.
pub const TARGET_HIT_AT: f64 = 3.0;
pub const PROFIT_AT: f64 = 1.5;
pub const FLAT_AT: f64 = 0.0;
pub const SMALL_LOSS_AT: f64 = -2.0;

// Absorbs float noise such as 10.0 -> 10.3 giving 2.9999999999999996.
const EPSILON: f64 = 1e-9;

/// Band for an unrounded percent change.
pub fn classify(change_percent: f64) -> OutcomeStatus {
    let at_least = |threshold: f64| change_percent + EPSILON >= threshold;
    if at_least(TARGET_HIT_AT) {
        OutcomeStatus::TargetHit
    } else if at_least(PROFIT_AT) {
        OutcomeStatus::Profit
    } else if at_least(FLAT_AT) {
        OutcomeStatus::Flat
    } else if at_least(SMALL_LOSS_AT) {
        OutcomeStatus::SmallLoss
    } else {
        OutcomeStatus::StopLoss
    }
}

/// Same-day outcome of each morning pick against the evening observation.
pub fn evaluate(
    picks: &[RocketPick],
    current: &HashMap<String, PriceObservation>,
) -> Vec<RocketOutcome> {
    picks
        .iter()
        .map(|pick| {
            let observed = current
                .get(&pick.symbol)
                .filter(|o| o.has_valid_price() && pick.morning_price > 0.0);

            let Some(obs) = observed else {
                tracing::warn!(symbol = %pick.symbol, "no usable evening price for rocket pick");
                return RocketOutcome {
                    pick: pick.clone(),
                    evening_price: None,
                    change_percent: None,
                    status: OutcomeStatus::NoData,
                    recommendation: OutcomeStatus::NoData.recommendation().to_string(),
                    message: "could not fetch current data".to_string(),
                };
            };

            let raw = (obs.price - pick.morning_price) / pick.morning_price * 100.0;
            let status = classify(raw);
            let change = round_to(raw, 2);
            RocketOutcome {
                pick: pick.clone(),
                evening_price: Some(obs.price),
                change_percent: Some(change),
                status,
                recommendation: status.recommendation().to_string(),
                message: message(status, change),
            }
        })
        .collect()
}

fn message(status: OutcomeStatus, change: f64) -> String {
    match status {
        OutcomeStatus::TargetHit => format!("up {change:.1}%, take the profit"),
        OutcomeStatus::Profit => format!("up {change:.1}%, consider selling half the position"),
        OutcomeStatus::Flat => format!("unchanged ({change:+.1}%), hold until tomorrow"),
        OutcomeStatus::SmallLoss => format!("down {change:.1}%, minor dip, hold"),
        OutcomeStatus::StopLoss => format!("down {change:.1}%, consider taking the loss"),
        OutcomeStatus::NoData => "could not fetch current data".to_string(),
    }
}
