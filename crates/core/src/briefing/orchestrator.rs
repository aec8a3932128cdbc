use crate::analysis::{Analyzer, CycleInputs};
use crate::briefing::report;
use crate::config::Settings;
use crate::domain::analysis::InstrumentAnalysis;
use crate::domain::briefing::{Briefing, DISCLAIMER};
use crate::domain::instrument::Universe;
use crate::domain::market::PriceObservation;
use crate::domain::recommendation::BriefingKind;
use crate::domain::rocket::{HistoryDay, RocketOutcome, RocketPick};
use crate::error::Result;
use crate::ingest::Providers;
use crate::rocket::{evaluator, selector, RocketWeights};
use crate::storage::PickStore;
use crate::time::MarketClock;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub concurrency: usize,
    pub top_n: usize,
    pub provider_timeout: Duration,
    pub cache_ttl: Duration,
    pub utc_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 12,
            top_n: selector::DEFAULT_TOP_N,
            provider_timeout: Duration::from_secs(20),
            cache_ttl: Duration::from_secs(30 * 60),
            utc_offset_minutes: 60,
        }
    }
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            concurrency: settings.analysis_concurrency,
            top_n: settings.rocket_top_n,
            provider_timeout: settings.provider_timeout,
            cache_ttl: settings.cache_ttl,
            utc_offset_minutes: settings.market_utc_offset_minutes,
        }
    }
}

/// Drives one morning or evening cycle end to end.
pub struct BriefingEngine {
    universe: Arc<Universe>,
    analyzer: Arc<Analyzer>,
    picks: PickStore,
    clock: MarketClock,
    weights: RocketWeights,
    concurrency: usize,
    top_n: usize,
}

impl BriefingEngine {
    pub fn new(
        universe: Universe,
        providers: Providers,
        picks: PickStore,
        config: EngineConfig,
    ) -> Result<Self> {
        let clock = MarketClock::from_offset_minutes(config.utc_offset_minutes)?;
        let analyzer = Analyzer::new(
            providers,
            universe.news_feeds.clone(),
            universe.sentiment_keywords.clone(),
            config.provider_timeout,
            config.cache_ttl,
        );
        let weights = universe.rocket_weights.clone().unwrap_or_default();

        Ok(Self {
            universe: Arc::new(universe),
            analyzer: Arc::new(analyzer),
            picks,
            clock,
            weights,
            concurrency: config.concurrency.max(1),
            top_n: config.top_n.max(1),
        })
    }

    pub fn clock(&self) -> MarketClock {
        self.clock
    }

    pub fn picks(&self) -> &PickStore {
        &self.picks
    }

    pub async fn generate(&self, kind: BriefingKind) -> Briefing {
        self.generate_at(kind, Utc::now()).await
    }

    /// Full cycle at `now`. Never fails: unit and store problems end up in `warnings`.
    pub async fn generate_at(&self, kind: BriefingKind, now: DateTime<Utc>) -> Briefing {
        let date = self.clock.today(now);
        tracing::info!(%kind, %date, instruments = self.universe.instruments.len(), "generating briefing");

        let inputs = Arc::new(self.analyzer.prepare().await);
        let mut warnings = inputs.warnings.clone();

        let analyses = self
            .analyze_all(kind, Arc::clone(&inputs), now)
            .await;
        for a in &analyses {
            if let Some(err) = &a.error {
                warnings.push(format!("{}: {err}", a.symbol()));
            }
        }
        let analyses = report::order_for(kind, analyses);

        let mut rocket_picks = Vec::new();
        let mut rocket_followup = Vec::new();
        match kind {
            BriefingKind::Morning => {
                rocket_picks = self.pick_rockets(date, &analyses, now, &mut warnings).await;
            }
            BriefingKind::Evening => {
                rocket_followup = self.follow_up(date, &analyses, &mut warnings).await;
            }
        }

        let swept = self.analyzer.sweep_cache();
        tracing::info!(
            %kind,
            %date,
            analyzed = analyses.len(),
            picks = rocket_picks.len(),
            followup = rocket_followup.len(),
            warnings = warnings.len(),
            swept,
            "briefing generated"
        );

        Briefing {
            id: Uuid::new_v4(),
            kind,
            date,
            generated_at: now,
            market_status: self.clock.market_status(now),
            summary: report::summary_text(kind, date, &analyses),
            highlights: report::highlights(&analyses),
            recommendations: report::recommendations(kind, &analyses),
            disclosure_notable: report::notable_disclosures(&analyses),
            rocket_picks,
            rocket_followup,
            warnings,
            disclaimer: DISCLAIMER.to_string(),
        }
    }

    /// Bounded fan-out; results come back in universe order.
    async fn analyze_all(
        &self,
        kind: BriefingKind,
        inputs: Arc<CycleInputs>,
        now: DateTime<Utc>,
    ) -> Vec<InstrumentAnalysis> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(self.universe.instruments.len());

        for instrument in &self.universe.instruments {
            let analyzer = Arc::clone(&self.analyzer);
            let inputs = Arc::clone(&inputs);
            let semaphore = Arc::clone(&semaphore);
            let instrument = instrument.clone();
            let with_technical = kind == BriefingKind::Morning && instrument.is_home();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                analyzer
                    .analyze(&instrument, &inputs, with_technical, now)
                    .await
            });
            handles.push(handle);
        }

        let mut out = Vec::with_capacity(handles.len());
        for (handle, instrument) in handles.into_iter().zip(&self.universe.instruments) {
            match handle.await {
                Ok(analysis) => out.push(analysis),
                Err(err) => {
                    tracing::error!(symbol = %instrument.symbol, error = %err, "analysis task failed");
                    out.push(InstrumentAnalysis::placeholder(
                        instrument.clone(),
                        format!("analysis task failed: {err}"),
                        now,
                    ));
                }
            }
        }
        out
    }

    async fn pick_rockets(
        &self,
        date: NaiveDate,
        analyses: &[InstrumentAnalysis],
        now: DateTime<Utc>,
        warnings: &mut Vec<String>,
    ) -> Vec<RocketPick> {
        let picks = selector::select(analyses, self.top_n, &self.weights, now);
        if picks.is_empty() {
            tracing::info!(%date, "no rocket candidates today");
            return picks;
        }

        let symbols: Vec<&str> = picks.iter().map(|p| p.symbol.as_str()).collect();
        tracing::info!(%date, ?symbols, "selected rocket picks");

        if let Err(err) = self.picks.save_picks(date, &picks).await {
            tracing::error!(%date, error = %err, "failed to persist rocket picks");
            warnings.push(format!("rocket picks were not saved: {err}"));
        }
        picks
    }

    async fn follow_up(
        &self,
        date: NaiveDate,
        analyses: &[InstrumentAnalysis],
        warnings: &mut Vec<String>,
    ) -> Vec<RocketOutcome> {
        let picks = match self.picks.load_picks(date).await {
            Ok(Some(picks)) if !picks.is_empty() => picks,
            Ok(_) => {
                tracing::info!(%date, "no rocket picks to follow up");
                return Vec::new();
            }
            Err(err) => {
                tracing::error!(%date, error = %err, "failed to load rocket picks");
                warnings.push(format!("rocket picks could not be loaded: {err}"));
                return Vec::new();
            }
        };

        let current: HashMap<String, PriceObservation> = analyses
            .iter()
            .filter_map(|a| a.observation.clone().map(|o| (a.symbol().to_string(), o)))
            .collect();
        let outcomes = evaluator::evaluate(&picks, &current);

        if let Err(err) = self
            .picks
            .append_history_day(&HistoryDay::new(date, outcomes.clone()))
            .await
        {
            tracing::error!(%date, error = %err, "failed to persist rocket history");
            warnings.push(format!("rocket history was not saved: {err}"));
        }
        outcomes
    }
}
