use crate::config::Settings;
use crate::domain::market::{Bar, PriceObservation};
use crate::error::{Error, Result};
use crate::ingest::provider::{JsonHttp, MarketDataProvider};
use crate::ingest::types::{ChartEnvelope, ChartResult};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const CURRENT_RANGE: &str = "5d";

/// Market data backed by the Yahoo Finance chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: JsonHttp,
    base_url: String,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .market_data_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            http: JsonHttp::from_settings(settings)?,
            base_url,
        })
    }

    fn url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        )
    }

    async fn chart(&self, symbol: &str, range: &str) -> Result<ChartResult> {
        let envelope: ChartEnvelope = self
            .http
            .get(
                &self.url(symbol),
                &[("range", range.to_string()), ("interval", "1d".to_string())],
                HeaderMap::new(),
            )
            .await?;
        first_result(symbol, envelope)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn price_history(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Bar>> {
        let result = self.chart(symbol, range_for(lookback_days)).await?;
        let bars = bars_from_chart(&result);
        if bars.is_empty() {
            return Err(Error::NotFound(format!("no price history for {symbol}")));
        }
        Ok(bars)
    }

    async fn current_info(&self, symbol: &str) -> Result<PriceObservation> {
        let result = self.chart(symbol, CURRENT_RANGE).await?;
        observation_from_chart(symbol, &result, Utc::now())
    }
}

fn first_result(symbol: &str, envelope: ChartEnvelope) -> Result<ChartResult> {
    if let Some(err) = envelope.chart.error {
        let detail = err.description.unwrap_or_default();
        if err.code.eq_ignore_ascii_case("not found") {
            return Err(Error::NotFound(format!("{symbol}: {detail}")));
        }
        return Err(Error::upstream(format!("{symbol}: {} {detail}", err.code)));
    }

    envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| Error::NotFound(format!("no chart data for {symbol}")))
}

fn range_for(lookback_days: u32) -> &'static str {
    match lookback_days {
        0..=5 => "5d",
        6..=31 => "1mo",
        32..=92 => "3mo",
        93..=183 => "6mo",
        184..=366 => "1y",
        _ => "2y",
    }
}

/// Zips the columnar chart payload into bars, dropping rows with gaps or non-positive prices.
pub fn bars_from_chart(result: &ChartResult) -> Vec<Bar> {
    let Some(quote) = result.indicators.quote.first() else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let field = |col: &Vec<Option<f64>>| col.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            continue;
        };
        if ![open, high, low, close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
        {
            continue;
        }
        let Some(timestamp) = Utc.timestamp_opt(*ts, 0).single() else {
            continue;
        };
        let volume = field(&quote.volume)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
            .unwrap_or(0);

        out.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }
    out
}

/// Current price, day change and volume ratio from the last few daily bars.
pub fn observation_from_chart(
    symbol: &str,
    result: &ChartResult,
    now: DateTime<Utc>,
) -> Result<PriceObservation> {
    let bars = bars_from_chart(result);
    let Some(last) = bars.last() else {
        return Err(Error::NotFound(format!("no recent bars for {symbol}")));
    };

    let change_percent = match bars.len() {
        n if n >= 2 => {
            let prev = bars[n - 2].close;
            (last.close - prev) / prev * 100.0
        }
        _ => 0.0,
    };

    let avg_volume = bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64;
    let volume_ratio = if avg_volume > 0.0 {
        last.volume as f64 / avg_volume
    } else {
        1.0
    };

    Ok(PriceObservation {
        symbol: symbol.to_string(),
        price: last.close,
        change_percent,
        volume: last.volume,
        volume_ratio,
        high_52w: result.meta.fifty_two_week_high,
        low_52w: result.meta.fifty_two_week_low,
        market_cap: result.meta.market_cap,
        currency: result.meta.currency.clone().unwrap_or_else(|| "SEK".to_string()),
        observed_at: now,
    })
}
