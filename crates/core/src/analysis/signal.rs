use crate::domain::market::PriceObservation;
use crate::domain::signal::{
    DisclosureActivity, DisclosureSentiment, NewsSentiment, SentimentLabel, Signal, SignalType,
};

const PRICE_MOVE_THRESHOLD: f64 = 2.0;
const HIGH_VOLUME_RATIO: f64 = 1.5;
const LARGE_MOVE_THRESHOLD: f64 = 3.0;
const NEAR_52W: f64 = 0.05;

/// Additive score over price move, news and disclosures. Volume is reported but not scored.
pub fn score(
    observation: Option<&PriceObservation>,
    news: &NewsSentiment,
    disclosure: &DisclosureActivity,
) -> Signal {
    let mut score = 0;
    let mut reasons = Vec::new();

    match observation.filter(|o| o.has_valid_price()) {
        Some(obs) => {
            if obs.change_percent > PRICE_MOVE_THRESHOLD {
                score += 1;
                reasons.push(format!("positive price move ({:+.1}%)", obs.change_percent));
            } else if obs.change_percent < -PRICE_MOVE_THRESHOLD {
                score -= 1;
                reasons.push(format!("negative price move ({:+.1}%)", obs.change_percent));
            }
            if obs.volume_ratio > HIGH_VOLUME_RATIO {
                reasons.push(format!("high volume ({:.1}x average)", obs.volume_ratio));
            }
        }
        None => reasons.push("no price data".to_string()),
    }

    match news.overall {
        SentimentLabel::Positive => {
            score += 1;
            reasons.push(format!(
                "positive news sentiment ({} articles)",
                news.article_count
            ));
        }
        SentimentLabel::Negative => {
            score -= 1;
            reasons.push(format!(
                "negative news sentiment ({} articles)",
                news.article_count
            ));
        }
        _ => {}
    }

    if disclosure.has_activity {
        match disclosure.sentiment {
            DisclosureSentiment::Bullish => {
                score += 1;
                reasons.push(format!("bullish disclosures: {}", disclosure.description));
            }
            DisclosureSentiment::Bearish => {
                score -= 1;
                reasons.push(format!("bearish disclosures: {}", disclosure.description));
            }
            DisclosureSentiment::Neutral => {
                reasons.push(format!("disclosures: {}", disclosure.description));
            }
        }
    }

    Signal {
        score,
        kind: SignalType::from_score(score),
        reasons,
    }
}

/// Flags for unusual volume, large moves and proximity to the 52-week range.
pub fn unusual_activity(observation: &PriceObservation) -> Vec<String> {
    let mut flags = Vec::new();
    if !observation.has_valid_price() {
        return flags;
    }

    if observation.volume_ratio > HIGH_VOLUME_RATIO {
        flags.push(format!(
            "high volume: {:.2}x average",
            observation.volume_ratio
        ));
    }
    if observation.change_percent.abs() > LARGE_MOVE_THRESHOLD {
        flags.push(format!("large move: {:+.2}%", observation.change_percent));
    }
    if let Some(high) = observation.high_52w.filter(|h| *h > 0.0) {
        if observation.price > high * (1.0 - NEAR_52W) {
            flags.push("near 52-week high".to_string());
        }
    }
    if let Some(low) = observation.low_52w.filter(|l| *l > 0.0) {
        if observation.price < low * (1.0 + NEAR_52W) {
            flags.push("near 52-week low".to_string());
        }
    }
    flags
}
