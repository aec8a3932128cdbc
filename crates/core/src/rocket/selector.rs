use crate::domain::analysis::InstrumentAnalysis;
use crate::domain::market::Trend;
use crate::domain::rocket::RocketPick;
use crate::domain::round_to;
use crate::domain::signal::SentimentLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_N: usize = 2;
const PICK_REASONS: usize = 2;

const FALLBACK_STOP: f64 = 0.96;
const FALLBACK_TARGET: f64 = 1.05;

/// Composite scoring weights. Overridable from the universe file; the defaults are
/// the production values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RocketWeights {
    pub signal_multiplier: i32,
    pub rsi_oversold_below: f64,
    pub rsi_oversold_bonus: i32,
    pub rsi_low_below: f64,
    pub rsi_low_bonus: i32,
    pub rsi_overbought_above: f64,
    pub rsi_overbought_penalty: i32,
    pub volume_surge_above: f64,
    pub volume_surge_bonus: i32,
    pub volume_elevated_above: f64,
    pub volume_elevated_bonus: i32,
    pub trend_up_bonus: i32,
    pub reward_risk_min: f64,
    pub reward_risk_bonus: i32,
    pub positive_news_bonus: i32,
    pub disclosure_buy_bonus: i32,
}

impl Default for RocketWeights {
    fn default() -> Self {
        Self {
            signal_multiplier: 2,
            rsi_oversold_below: 35.0,
            rsi_oversold_bonus: 3,
            rsi_low_below: 45.0,
            rsi_low_bonus: 1,
            rsi_overbought_above: 70.0,
            rsi_overbought_penalty: -2,
            volume_surge_above: 2.0,
            volume_surge_bonus: 2,
            volume_elevated_above: 1.5,
            volume_elevated_bonus: 1,
            trend_up_bonus: 1,
            reward_risk_min: 2.0,
            reward_risk_bonus: 1,
            positive_news_bonus: 1,
            disclosure_buy_bonus: 1,
        }
    }
}

impl RocketWeights {
    fn volume_bonus(&self, ratio: f64) -> i32 {
        if ratio > self.volume_surge_above {
            self.volume_surge_bonus
        } else if ratio > self.volume_elevated_above {
            self.volume_elevated_bonus
        } else {
            0
        }
    }

    /// Composite score of one eligible candidate.
    pub fn composite(&self, a: &InstrumentAnalysis) -> i32 {
        let mut score = self.signal_multiplier * a.score();

        match &a.technical {
            Some(t) => {
                if t.rsi < self.rsi_oversold_below {
                    score += self.rsi_oversold_bonus;
                } else if t.rsi < self.rsi_low_below {
                    score += self.rsi_low_bonus;
                } else if t.rsi > self.rsi_overbought_above {
                    score += self.rsi_overbought_penalty;
                }
                score += self.volume_bonus(t.volume_spike);
                if t.trend == Trend::Up {
                    score += self.trend_up_bonus;
                }
                if t.reward_risk() >= self.reward_risk_min {
                    score += self.reward_risk_bonus;
                }
            }
            None => score += self.volume_bonus(a.volume_ratio()),
        }

        if a.news.overall == SentimentLabel::Positive {
            score += self.positive_news_bonus;
        }
        if a.disclosure.is_net_buy() {
            score += self.disclosure_buy_bonus;
        }
        score
    }
}

fn is_candidate(a: &InstrumentAnalysis) -> bool {
    a.instrument.is_home() && a.score() >= 0 && a.price() > 0.0
}

/// Top `top_n` home-market candidates by composite score. Ties keep input order.
pub fn select(
    candidates: &[InstrumentAnalysis],
    top_n: usize,
    weights: &RocketWeights,
    now: DateTime<Utc>,
) -> Vec<RocketPick> {
    let mut scored: Vec<(i32, &InstrumentAnalysis)> = candidates
        .iter()
        .filter(|a| is_candidate(a))
        .map(|a| (weights.composite(a), a))
        .collect();

    // `sort_by` is stable.
    scored.sort_by(|x, y| y.0.cmp(&x.0));

    scored
        .into_iter()
        .take(top_n)
        .map(|(rocket_score, a)| to_pick(a, rocket_score, now))
        .collect()
}

fn to_pick(a: &InstrumentAnalysis, rocket_score: i32, now: DateTime<Utc>) -> RocketPick {
    let price = a.price();
    let (entry, stop, target, stop_pct, target_pct, rsi) = match &a.technical {
        Some(t) => (t.entry, t.stop, t.target, t.stop_pct, t.target_pct, Some(t.rsi)),
        None => {
            let stop = price * FALLBACK_STOP;
            let target = price * FALLBACK_TARGET;
            (
                price,
                stop,
                target,
                round_to((stop - price) / price * 100.0, 1),
                round_to((target - price) / price * 100.0, 1),
                None,
            )
        }
    };

    let technical_signals = a.technical.iter().flat_map(|t| t.signals.iter());
    let reasons = a
        .signal
        .reasons
        .iter()
        .chain(technical_signals)
        .take(PICK_REASONS)
        .cloned()
        .collect();

    RocketPick {
        symbol: a.instrument.symbol.clone(),
        name: a.instrument.name.clone(),
        morning_price: price,
        entry,
        stop,
        target,
        stop_pct,
        target_pct,
        rsi,
        signal_score: a.score(),
        rocket_score,
        volume_ratio: a.volume_ratio(),
        news_sentiment: a.news.overall,
        reasons,
        pick_time: now,
    }
}
