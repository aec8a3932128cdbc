pub mod analysis;
pub mod briefing;
pub mod instrument;
pub mod market;
pub mod recommendation;
pub mod rocket;
pub mod signal;

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
