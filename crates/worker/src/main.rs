use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nordpuls_core::briefing::{BriefingEngine, EngineConfig};
use nordpuls_core::domain::briefing::Briefing;
use nordpuls_core::domain::instrument::Universe;
use nordpuls_core::domain::recommendation::BriefingKind;
use nordpuls_core::ingest::Providers;
use nordpuls_core::schedule::trigger_instant;
use nordpuls_core::storage::{lock, KvStore, MemoryStore, PgStore, PickStore};
use nordpuls_core::time::MarketClock;

#[derive(Debug, Parser)]
#[command(name = "nordpuls_worker")]
struct Args {
    /// Briefing to run: morning or evening.
    #[arg(long)]
    kind: BriefingKind,

    /// Exchange date (YYYY-MM-DD) the picks and history are keyed by. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// Run the cycle against an in-memory store and print the briefing.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = nordpuls_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(args, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %format!("{err:#}"), "worker run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(args: Args, settings: &nordpuls_core::config::Settings) -> anyhow::Result<()> {
    let clock = MarketClock::from_offset_minutes(settings.market_utc_offset_minutes)?;
    let now = chrono::Utc::now();
    let date = clock.resolve_date(args.date.as_deref(), now)?;
    // A date override replays the cycle at that day's scheduled time.
    let at = if args.date.is_some() {
        let time = match args.kind {
            BriefingKind::Morning => settings.morning_at,
            BriefingKind::Evening => settings.evening_at,
        };
        trigger_instant(clock, date, time)
    } else {
        now
    };

    let universe = Universe::load(&settings.universe_path)?;
    let providers = Providers::from_settings(settings)?;
    let config = EngineConfig::from_settings(settings);

    if args.dry_run {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let engine = BriefingEngine::new(universe, providers, PickStore::new(kv), config)?;
        let briefing = engine.generate_at(args.kind, at).await;
        log_briefing(&briefing, true);
        println!("{}", serde_json::to_string_pretty(&briefing)?);
        return Ok(());
    }

    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    nordpuls_core::storage::migrate(&pool).await?;

    let mut lock_conn = pool.acquire().await.context("acquire lock connection")?;
    let acquired = lock::try_acquire_briefing_lock(&mut lock_conn, date, args.kind).await?;
    if !acquired {
        tracing::warn!(%date, kind = %args.kind, "briefing lock not acquired; another run in progress");
        return Ok(());
    }

    let kv: Arc<dyn KvStore> = Arc::new(PgStore::new(pool.clone()));
    let engine = BriefingEngine::new(universe, providers, PickStore::new(kv), config)?;
    let briefing = engine.generate_at(args.kind, at).await;
    log_briefing(&briefing, false);

    let _ = lock::release_briefing_lock(&mut lock_conn, date, args.kind).await;
    Ok(())
}

fn log_briefing(briefing: &Briefing, dry_run: bool) {
    tracing::info!(
        date = %briefing.date,
        kind = %briefing.kind,
        dry_run,
        recommendations = briefing.recommendations.len(),
        picks = briefing.rocket_picks.len(),
        followup = briefing.rocket_followup.len(),
        warnings = briefing.warnings.len(),
        "briefing run finished"
    );
    for warning in &briefing.warnings {
        tracing::warn!(date = %briefing.date, kind = %briefing.kind, "{warning}");
    }
}

fn init_sentry(settings: &nordpuls_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
