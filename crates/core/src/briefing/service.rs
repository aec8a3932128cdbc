use crate::briefing::orchestrator::BriefingEngine;
use crate::domain::briefing::Briefing;
use crate::domain::recommendation::BriefingKind;
use crate::domain::rocket::{HistoryStats, RocketHistory};
use crate::error::Result;
use crate::rocket::simulator::{self, InvestmentSimulation};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use tokio::sync::{Mutex, RwLock};

pub const RECENT_BRIEFINGS: usize = 20;

#[derive(Default)]
struct State {
    latest: HashMap<BriefingKind, Briefing>,
    recent: VecDeque<Briefing>,
}

/// Process-scoped owner of the engine and of the briefings it produced.
///
/// At most one generation per briefing kind runs at a time. Forced regenerations
/// wait for a running cycle; scheduled runs skip instead.
pub struct BriefingService {
    engine: BriefingEngine,
    morning_guard: Mutex<()>,
    evening_guard: Mutex<()>,
    state: RwLock<State>,
}

impl BriefingService {
    pub fn new(engine: BriefingEngine) -> Self {
        Self {
            engine,
            morning_guard: Mutex::new(()),
            evening_guard: Mutex::new(()),
            state: RwLock::new(State::default()),
        }
    }

    pub fn engine(&self) -> &BriefingEngine {
        &self.engine
    }

    pub async fn latest(&self, kind: BriefingKind) -> Option<Briefing> {
        self.state.read().await.latest.get(&kind).cloned()
    }

    pub async fn generate_briefing(&self, kind: BriefingKind) -> Briefing {
        self.generate_briefing_at(kind, Utc::now()).await
    }

    /// Cached briefing for the current local date, or a fresh one.
    pub async fn generate_briefing_at(&self, kind: BriefingKind, now: DateTime<Utc>) -> Briefing {
        if let Some(cached) = self.cached_for_today(kind, now).await {
            return cached;
        }

        let _guard = self.guard(kind).lock().await;
        // Another caller may have finished while we waited.
        if let Some(cached) = self.cached_for_today(kind, now).await {
            return cached;
        }
        self.run(kind, now).await
    }

    pub async fn regenerate(&self, kind: BriefingKind) -> Briefing {
        self.regenerate_at(kind, Utc::now()).await
    }

    pub async fn regenerate_at(&self, kind: BriefingKind, now: DateTime<Utc>) -> Briefing {
        let _guard = self.guard(kind).lock().await;
        tracing::info!(%kind, "forced regeneration");
        self.run(kind, now).await
    }

    /// Returns `None` when a cycle of the same kind is already running.
    pub async fn run_scheduled(&self, kind: BriefingKind) -> Option<Briefing> {
        self.run_scheduled_at(kind, Utc::now()).await
    }

    pub async fn run_scheduled_at(&self, kind: BriefingKind, now: DateTime<Utc>) -> Option<Briefing> {
        let Ok(_guard) = self.guard(kind).try_lock() else {
            tracing::warn!(%kind, "briefing already in progress; skipping scheduled run");
            return None;
        };
        Some(self.run(kind, now).await)
    }

    /// Most recent briefings of either kind, newest first.
    pub async fn history(&self, limit: usize) -> Vec<Briefing> {
        let state = self.state.read().await;
        state.recent.iter().rev().take(limit).cloned().collect()
    }

    pub async fn rocket_history(&self, days: usize) -> Result<RocketHistory> {
        let history = self.engine.picks().load_history(days).await?;
        let stats = HistoryStats::from_history(&history);
        Ok(RocketHistory { history, stats })
    }

    /// What a fixed stake on each pick rank would have returned over `days`.
    pub async fn investment_simulation(&self, days: usize) -> Result<InvestmentSimulation> {
        let history = self.engine.picks().load_history(days).await?;
        Ok(simulator::simulate(&history))
    }

    async fn cached_for_today(&self, kind: BriefingKind, now: DateTime<Utc>) -> Option<Briefing> {
        let today = self.engine.clock().today(now);
        let state = self.state.read().await;
        state
            .latest
            .get(&kind)
            .filter(|b| b.date == today)
            .cloned()
    }

    async fn run(&self, kind: BriefingKind, now: DateTime<Utc>) -> Briefing {
        let briefing = self.engine.generate_at(kind, now).await;

        let mut state = self.state.write().await;
        state.latest.insert(kind, briefing.clone());
        state.recent.push_back(briefing.clone());
        while state.recent.len() > RECENT_BRIEFINGS {
            state.recent.pop_front();
        }
        briefing
    }

    fn guard(&self, kind: BriefingKind) -> &Mutex<()> {
        match kind {
            BriefingKind::Morning => &self.morning_guard,
            BriefingKind::Evening => &self.evening_guard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::briefing::orchestrator::EngineConfig;
    use crate::domain::instrument::{Instrument, Market, SentimentKeywords, Universe};
    use crate::domain::market::{Bar, PriceObservation};
    use crate::domain::signal::Disclosure;
    use crate::error::Error;
    use crate::ingest::provider::{DisclosureProvider, MarketDataProvider, NewsProvider};
    use crate::ingest::types::Article;
    use crate::ingest::Providers;
    use crate::storage::{MemoryStore, PickStore};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingMarket {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for CountingMarket {
        fn provider_name(&self) -> &'static str {
            "counting"
        }

        async fn price_history(&self, _symbol: &str, _lookback_days: u32) -> crate::Result<Vec<Bar>> {
            Err(Error::InsufficientData { needed: 14, got: 0 })
        }

        async fn current_info(&self, symbol: &str) -> crate::Result<PriceObservation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PriceObservation {
                symbol: symbol.to_string(),
                price: 120.0,
                change_percent: 0.5,
                volume: 10,
                volume_ratio: 1.0,
                high_52w: None,
                low_52w: None,
                market_cap: None,
                currency: "SEK".into(),
                observed_at: Utc::now(),
            })
        }
    }

    struct Empty;

    #[async_trait::async_trait]
    impl NewsProvider for Empty {
        fn provider_name(&self) -> &'static str {
            "empty"
        }

        async fn fetch_articles(&self, _feed_url: &str) -> crate::Result<Vec<Article>> {
            Ok(Vec::new())
        }
    }

    #[async_trait::async_trait]
    impl DisclosureProvider for Empty {
        fn provider_name(&self) -> &'static str {
            "empty"
        }

        async fn fetch_recent(&self, _lookback_days: u32) -> crate::Result<Vec<Disclosure>> {
            Ok(Vec::new())
        }
    }

    fn service(market: Arc<CountingMarket>) -> BriefingService {
        let universe = Universe {
            instruments: vec![Instrument {
                symbol: "ABB.ST".into(),
                name: "ABB".into(),
                market: Market::Home,
                cap_size: None,
            }],
            news_feeds: Vec::new(),
            sentiment_keywords: SentimentKeywords::default(),
            rocket_weights: None,
        };
        let providers = Providers {
            market,
            news: Arc::new(Empty),
            disclosures: Arc::new(Empty),
        };
        let engine = BriefingEngine::new(
            universe,
            providers,
            PickStore::new(Arc::new(MemoryStore::new())),
            EngineConfig::default(),
        )
        .unwrap();
        BriefingService::new(engine)
    }

    #[tokio::test]
    async fn caches_per_local_date() {
        let market = Arc::new(CountingMarket::default());
        let svc = service(Arc::clone(&market));
        let morning = Utc.with_ymd_and_hms(2026, 3, 2, 7, 15, 0).unwrap();

        let first = svc.generate_briefing_at(BriefingKind::Evening, morning).await;
        let second = svc
            .generate_briefing_at(BriefingKind::Evening, morning + chrono::Duration::hours(3))
            .await;
        assert_eq!(first.id, second.id);
        assert_eq!(market.calls.load(Ordering::SeqCst), 1);

        let next_day = svc
            .generate_briefing_at(BriefingKind::Evening, morning + chrono::Duration::days(1))
            .await;
        assert_ne!(first.id, next_day.id);
        assert_eq!(market.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn regenerate_always_runs_and_history_is_newest_first() {
        let market = Arc::new(CountingMarket::default());
        let svc = service(Arc::clone(&market));
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 16, 15, 0).unwrap();

        let a = svc.generate_briefing_at(BriefingKind::Evening, now).await;
        let b = svc.regenerate_at(BriefingKind::Evening, now).await;
        assert_ne!(a.id, b.id);
        assert_eq!(svc.latest(BriefingKind::Evening).await.map(|x| x.id), Some(b.id));

        let ids: Vec<_> = svc.history(10).await.into_iter().map(|x| x.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn recent_briefings_are_capped() {
        let svc = service(Arc::new(CountingMarket::default()));
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 16, 15, 0).unwrap();
        for _ in 0..(RECENT_BRIEFINGS + 5) {
            svc.regenerate_at(BriefingKind::Morning, now).await;
        }
        assert_eq!(svc.history(100).await.len(), RECENT_BRIEFINGS);
    }

    #[tokio::test]
    async fn scheduled_run_skips_when_busy() {
        let svc = service(Arc::new(CountingMarket::default()));
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 15, 0).unwrap();

        let held = svc.guard(BriefingKind::Morning).lock().await;
        assert!(svc.run_scheduled_at(BriefingKind::Morning, now).await.is_none());
        assert!(svc.run_scheduled_at(BriefingKind::Evening, now).await.is_some());
        drop(held);
        assert!(svc.run_scheduled_at(BriefingKind::Morning, now).await.is_some());
    }

    #[tokio::test]
    async fn rocket_history_aggregates_stats() {
        let svc = service(Arc::new(CountingMarket::default()));
        let morning = Utc.with_ymd_and_hms(2026, 3, 2, 7, 15, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 3, 2, 16, 15, 0).unwrap();

        svc.generate_briefing_at(BriefingKind::Morning, morning).await;
        svc.generate_briefing_at(BriefingKind::Evening, evening).await;

        let rockets = svc.rocket_history(30).await.unwrap();
        assert_eq!(rockets.stats.total_days, 1);
        assert_eq!(rockets.history[0].results.len(), 1);
    }

    #[tokio::test]
    async fn simulation_replays_stored_history() {
        let svc = service(Arc::new(CountingMarket::default()));
        let morning = Utc.with_ymd_and_hms(2026, 3, 2, 7, 15, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 3, 2, 16, 15, 0).unwrap();

        let empty = svc.investment_simulation(30).await.unwrap();
        assert!(empty.rockets.is_empty());

        svc.generate_briefing_at(BriefingKind::Morning, morning).await;
        svc.generate_briefing_at(BriefingKind::Evening, evening).await;

        let sim = svc.investment_simulation(30).await.unwrap();
        assert_eq!(sim.days, 1);
        assert_eq!(sim.rockets.len(), 1);
        assert_eq!(sim.combined.trade_count, 1);
        assert_eq!(sim.combined.start_10000, 10_000.0);
    }
}
