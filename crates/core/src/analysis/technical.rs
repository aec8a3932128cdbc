use crate::domain::market::{Bar, TechnicalSnapshot, Trend};
use crate::domain::round_to;
use crate::error::{Error, Result};

pub const MIN_BARS: usize = 14;
const RSI_PERIOD: usize = 14;
const ATR_PERIOD: usize = 14;
const LEVEL_WINDOW: usize = 20;

const ATR_STOP_MULTIPLE: f64 = 2.0;
const REWARD_MULTIPLE: f64 = 3.0;
const LEVEL_BUFFER: f64 = 0.99;
const FALLBACK_STOP: f64 = 0.96;
const FALLBACK_TARGET: f64 = 1.05;
const PROXIMITY: f64 = 0.02;

/// Indicators and trade levels from a trailing window of daily bars (oldest first).
pub fn compute(symbol: &str, bars: &[Bar]) -> Result<TechnicalSnapshot> {
    if bars.len() < MIN_BARS {
        return Err(Error::InsufficientData {
            needed: MIN_BARS,
            got: bars.len(),
        });
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let price = closes[closes.len() - 1];
    if !(price.is_finite() && price > 0.0) {
        return Err(Error::InsufficientData {
            needed: MIN_BARS,
            got: 0,
        });
    }

    let rsi = round_to(rsi(&closes, RSI_PERIOD), 1);
    let atr = atr(bars, ATR_PERIOD);
    let (support, resistance) = support_resistance(bars, price);
    let volume_spike = volume_spike(bars);
    let ma20 = mean(&closes[closes.len().saturating_sub(LEVEL_WINDOW)..]);
    let trend = if price > ma20 { Trend::Up } else { Trend::Down };

    let (stop, target) = trade_levels(price, atr, support, resistance);

    let mut signals = Vec::new();
    if rsi < 30.0 {
        signals.push("RSI oversold (<30)".to_string());
    } else if rsi > 70.0 {
        signals.push("RSI overbought (>70)".to_string());
    } else if (40.0..=60.0).contains(&rsi) {
        signals.push(format!("RSI neutral momentum ({rsi:.0})"));
    }
    if volume_spike > 1.5 {
        signals.push(format!("volume spike {volume_spike:.1}x average"));
    }
    if price > resistance * (1.0 - PROXIMITY) {
        signals.push(format!("testing resistance at {resistance:.2}"));
    }
    if price < support * (1.0 + PROXIMITY) {
        signals.push(format!("near support at {support:.2}"));
    }
    signals.push(match trend {
        Trend::Up => "above 20-day MA (uptrend)".to_string(),
        Trend::Down => "below 20-day MA (downtrend)".to_string(),
    });

    Ok(TechnicalSnapshot {
        symbol: symbol.to_string(),
        price,
        rsi,
        support,
        resistance,
        atr,
        volume_spike: round_to(volume_spike, 2),
        ma20,
        trend,
        entry: price,
        stop,
        target,
        stop_pct: round_to((stop - price) / price * 100.0, 1),
        target_pct: round_to((target - price) / price * 100.0, 1),
        signals,
    })
}

/// Stop below and target above `entry`, with fixed-percentage fallbacks.
fn trade_levels(entry: f64, atr: f64, support: f64, resistance: f64) -> (f64, f64) {
    let mut stop = (entry - ATR_STOP_MULTIPLE * atr).max(support * LEVEL_BUFFER);
    if !(stop < entry) {
        stop = entry * FALLBACK_STOP;
    }

    let mut target = (entry + REWARD_MULTIPLE * (entry - stop)).min(resistance * LEVEL_BUFFER);
    if !(target > entry) {
        target = entry * FALLBACK_TARGET;
    }

    (stop, target)
}

/// Wilder RSI. Seeded with a simple average over the first `period` deltas.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    if deltas.is_empty() || period == 0 {
        return 100.0;
    }

    let seed = period.min(deltas.len());
    let mut avg_gain = deltas[..seed].iter().map(|d| d.max(0.0)).sum::<f64>() / seed as f64;
    let mut avg_loss = deltas[..seed].iter().map(|d| (-d).max(0.0)).sum::<f64>() / seed as f64;

    let p = period as f64;
    for d in &deltas[seed..] {
        avg_gain = (avg_gain * (p - 1.0) + d.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-d).max(0.0)) / p;
    }

    if avg_loss <= 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

/// Mean of the last `period` true ranges. The first bar has no previous close.
pub fn atr(bars: &[Bar], period: usize) -> f64 {
    let ranges: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let hl = b.high - b.low;
            match i.checked_sub(1).map(|p| bars[p].close) {
                Some(prev) => hl.max((b.high - prev).abs()).max((b.low - prev).abs()),
                None => hl,
            }
        })
        .collect();
    mean(&ranges[ranges.len().saturating_sub(period)..])
}

/// Nearest local low below and local high above `price` in the trailing window,
/// falling back to the window's extremes.
fn support_resistance(bars: &[Bar], price: f64) -> (f64, f64) {
    let window = &bars[bars.len().saturating_sub(LEVEL_WINDOW)..];

    let mut resistance: Option<f64> = None;
    let mut support: Option<f64> = None;
    for i in 1..window.len().saturating_sub(1) {
        let (prev, cur, next) = (&window[i - 1], &window[i], &window[i + 1]);
        if cur.high > prev.high && cur.high > next.high && cur.high > price {
            resistance = Some(resistance.map_or(cur.high, |r| r.min(cur.high)));
        }
        if cur.low < prev.low && cur.low < next.low && cur.low < price {
            support = Some(support.map_or(cur.low, |s| s.max(cur.low)));
        }
    }

    let window_high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let window_low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    (
        support.unwrap_or(window_low),
        resistance.unwrap_or(window_high),
    )
}

fn volume_spike(bars: &[Bar]) -> f64 {
    let window = &bars[bars.len().saturating_sub(LEVEL_WINDOW)..];
    let volumes: Vec<f64> = window.iter().map(|b| b.volume as f64).collect();
    let avg = mean(&volumes);
    match bars.last() {
        Some(last) if avg > 0.0 => last.volume as f64 / avg,
        _ => 1.0,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
