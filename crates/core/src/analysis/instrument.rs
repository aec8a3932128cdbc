use crate::analysis::{disclosure, news, signal, technical};
use crate::cache::{CacheKey, TtlCache};
use crate::domain::analysis::InstrumentAnalysis;
use crate::domain::instrument::{Instrument, NewsFeed, SentimentKeywords};
use crate::domain::signal::Disclosure;
use crate::error::{Error, Result};
use crate::ingest::types::Article;
use crate::ingest::Providers;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;

pub const TECHNICAL_LOOKBACK_DAYS: u32 = 60;

/// Inputs shared by every unit of one cycle, fetched once up front.
#[derive(Debug, Clone, Default)]
pub struct CycleInputs {
    pub articles: Vec<Article>,
    pub disclosures: Vec<Disclosure>,
    pub warnings: Vec<String>,
}

/// Runs one instrument's analysis against the providers. Never fails; problems are
/// recorded on the result.
pub struct Analyzer {
    providers: Providers,
    feeds: Vec<NewsFeed>,
    keywords: SentimentKeywords,
    timeout: Duration,
    feed_cache: TtlCache<Vec<Article>>,
    disclosure_cache: TtlCache<Vec<Disclosure>>,
}

impl Analyzer {
    pub fn new(
        providers: Providers,
        feeds: Vec<NewsFeed>,
        keywords: SentimentKeywords,
        timeout: Duration,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            providers,
            feeds,
            keywords,
            timeout,
            feed_cache: TtlCache::new(cache_ttl),
            disclosure_cache: TtlCache::new(cache_ttl),
        }
    }

    /// Fetches all feeds and the disclosure list through the TTL cache. Upstream
    /// failures degrade to empty inputs plus a warning.
    pub async fn prepare(&self) -> CycleInputs {
        let mut inputs = CycleInputs::default();

        for feed in &self.feeds {
            let key = CacheKey::new("news.fetch_articles", feed.url.as_str());
            let fetched = self
                .feed_cache
                .get_or_compute(key, || {
                    self.timed("news.fetch_articles", self.providers.news.fetch_articles(&feed.url))
                })
                .await;
            match fetched {
                Ok(articles) => inputs.articles.extend(articles),
                Err(err) => {
                    tracing::warn!(feed = %feed.name, error = %err, "news feed unavailable");
                    inputs.warnings.push(format!("news feed {} unavailable: {err}", feed.name));
                }
            }
        }
        inputs
            .articles
            .sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let key = CacheKey::new(
            "disclosures.fetch_recent",
            disclosure::LOOKBACK_DAYS.to_string(),
        );
        let fetched = self
            .disclosure_cache
            .get_or_compute(key, || {
                self.timed(
                    "disclosures.fetch_recent",
                    self.providers.disclosures.fetch_recent(disclosure::LOOKBACK_DAYS),
                )
            })
            .await;
        match fetched {
            Ok(d) => inputs.disclosures = d,
            Err(err) => {
                tracing::warn!(error = %err, "disclosures unavailable");
                inputs.warnings.push(format!("disclosures unavailable: {err}"));
            }
        }

        tracing::info!(
            articles = inputs.articles.len(),
            disclosures = inputs.disclosures.len(),
            "cycle inputs ready"
        );
        inputs
    }

    pub async fn analyze(
        &self,
        instrument: &Instrument,
        inputs: &CycleInputs,
        with_technical: bool,
        now: DateTime<Utc>,
    ) -> InstrumentAnalysis {
        let symbol = instrument.symbol.as_str();
        let mut errors: Vec<String> = Vec::new();

        let observation = match self
            .timed("market.current_info", self.providers.market.current_info(symbol))
            .await
        {
            Ok(obs) if obs.has_valid_price() => Some(obs),
            Ok(_) => {
                errors.push(format!("{symbol}: non-positive price"));
                None
            }
            Err(err) => {
                tracing::warn!(symbol, error = %err, "price unavailable");
                errors.push(err.to_string());
                None
            }
        };

        let technical = if with_technical && observation.is_some() {
            match self.technical(symbol).await {
                Ok(t) => Some(t),
                Err(err @ Error::InsufficientData { .. }) => {
                    tracing::debug!(symbol, error = %err, "technicals skipped");
                    None
                }
                Err(err) => {
                    tracing::warn!(symbol, error = %err, "technicals unavailable");
                    None
                }
            }
        } else {
            None
        };

        let (news_sentiment, headlines) =
            news::analyze(instrument, &inputs.articles, &self.keywords);
        let disclosure_activity =
            disclosure::activity_for(&instrument.disclosure_ticker(), &inputs.disclosures);
        let signal = signal::score(observation.as_ref(), &news_sentiment, &disclosure_activity);
        let unusual_activity = observation
            .as_ref()
            .map(signal::unusual_activity)
            .unwrap_or_default();

        InstrumentAnalysis {
            instrument: instrument.clone(),
            observation,
            technical,
            news: news_sentiment,
            disclosure: disclosure_activity,
            signal,
            unusual_activity,
            headlines,
            error: (!errors.is_empty()).then(|| errors.join("; ")),
            analyzed_at: now,
        }
    }

    async fn technical(&self, symbol: &str) -> Result<crate::domain::market::TechnicalSnapshot> {
        let bars = self
            .timed(
                "market.price_history",
                self.providers
                    .market
                    .price_history(symbol, TECHNICAL_LOOKBACK_DAYS),
            )
            .await?;
        technical::compute(symbol, &bars)
    }

    async fn timed<T>(&self, operation: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout {
                operation: operation.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }

    /// Drops expired cache entries.
    pub fn sweep_cache(&self) -> usize {
        self.feed_cache.sweep() + self.disclosure_cache.sweep()
    }
}
