use crate::config::Settings;
use crate::domain::market::{Bar, PriceObservation};
use crate::domain::signal::Disclosure;
use crate::error::{Error, Result};
use crate::ingest::types::Article;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily bars, oldest first.
    async fn price_history(&self, symbol: &str, lookback_days: u32) -> Result<Vec<Bar>>;

    async fn current_info(&self, symbol: &str) -> Result<PriceObservation>;
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Articles of one feed, newest first.
    async fn fetch_articles(&self, feed_url: &str) -> Result<Vec<Article>>;
}

#[async_trait::async_trait]
pub trait DisclosureProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Normalized disclosures whose transaction date falls inside the lookback window.
    async fn fetch_recent(&self, lookback_days: u32) -> Result<Vec<Disclosure>>;
}

/// Thin JSON-over-HTTP client shared by the concrete providers.
#[derive(Debug, Clone)]
pub struct JsonHttp {
    http: reqwest::Client,
    retries: u32,
}

impl JsonHttp {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.provider_timeout)
            .user_agent(concat!("nordpuls/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("failed to build provider http client: {e}")))?;

        Ok(Self {
            http,
            retries: settings.provider_retries,
        })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<T> {
        with_retries(self.retries, url, || {
            self.get_once(url, query, headers.clone())
        })
        .await
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: HeaderMap,
    ) -> Result<T> {
        let res = self
            .http
            .get(url)
            .headers(headers)
            .query(query)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(Error::upstream(format!(
                "{url} returned HTTP {status}: {}",
                truncate(&text, 200)
            )));
        }

        serde_json::from_str::<T>(&text)
            .map_err(|e| Error::upstream(format!("{url} returned malformed JSON: {e}")))
    }
}

/// Runs `op` up to `retries` times with exponential backoff (1s, 2s, 4s ...).
/// Only retryable failures are attempted again.
pub async fn with_retries<T, F, Fut>(retries: u32, operation: &str, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_backoff(retries, Duration::from_secs(1), operation, op).await
}

async fn retry_with_backoff<T, F, Fut>(
    retries: u32,
    base: Duration,
    operation: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = retries.max(1);
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(err) => {
                if attempt >= max_attempts || !err.is_retryable() {
                    return Err(err);
                }
                let backoff = backoff_delay(base, attempt);
                tracing::warn!(attempt, ?backoff, operation, error = %err, "provider call failed; retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// `base * 2^(attempt - 1)`, saturating and capped at one minute.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}
