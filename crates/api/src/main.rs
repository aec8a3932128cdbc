use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nordpuls_core::briefing::{BriefingEngine, BriefingService, EngineConfig};
use nordpuls_core::domain::briefing::Briefing;
use nordpuls_core::domain::instrument::Universe;
use nordpuls_core::domain::recommendation::BriefingKind;
use nordpuls_core::domain::rocket::RocketHistory;
use nordpuls_core::rocket::simulator::InvestmentSimulation;
use nordpuls_core::ingest::Providers;
use nordpuls_core::schedule::Scheduler;
use nordpuls_core::storage::{KvStore, MemoryStore, PgStore, PickStore};

const DEFAULT_HISTORY_LIMIT: usize = 20;
const DEFAULT_ROCKET_DAYS: usize = 30;

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

    let universe = Universe::load(&settings.universe_path)?;
    let providers = Providers::from_settings(&settings)?;

    let kv: Arc<dyn KvStore> = match connect_store(&settings).await {
        Some(pool) => Arc::new(PgStore::new(pool)),
        None => Arc::new(MemoryStore::new()),
    };

    let engine = BriefingEngine::new(
        universe,
        providers,
        PickStore::new(kv),
        EngineConfig::from_settings(&settings),
    )?;
    let service = Arc::new(BriefingService::new(engine));

    let scheduler = tokio::spawn(Scheduler::from_settings(Arc::clone(&service), &settings).run());

    let state = AppState { service };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/briefings/history", get(get_briefing_history))
        .route("/briefings/:kind", get(get_briefing))
        .route("/briefings/:kind/regenerate", post(regenerate_briefing))
        .route("/rockets/history", get(get_rocket_history))
        .route("/rockets/simulation", get(get_investment_simulation))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.abort();
    Ok(())
}

/// Postgres when reachable and migrated; otherwise `None` and the API runs on the
/// in-memory store in degraded mode.
async fn connect_store(settings: &nordpuls_core::config::Settings) -> Option<PgPool> {
    let db_url = match settings.require_database_url() {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            return None;
        }
    };

    let pool = match sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
            return None;
        }
    };

    match nordpuls_core::storage::migrate(&pool).await {
        Ok(()) => Some(pool),
        Err(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "db migrations failed; starting API in degraded mode");
            None
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    service: Arc<BriefingService>,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RocketQuery {
    days: Option<usize>,
}

fn parse_kind(raw: &str) -> Result<BriefingKind, StatusCode> {
    raw.parse().map_err(|_| StatusCode::BAD_REQUEST)
}

async fn get_briefing(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Briefing>, StatusCode> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.service.generate_briefing(kind).await))
}

async fn regenerate_briefing(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Briefing>, StatusCode> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.service.regenerate(kind).await))
}

async fn get_briefing_history(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Json<Vec<Briefing>> {
    let limit = q.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Json(state.service.history(limit).await)
}

async fn get_rocket_history(
    State(state): State<AppState>,
    Query(q): Query<RocketQuery>,
) -> Result<Json<RocketHistory>, StatusCode> {
    let days = q.days.unwrap_or(DEFAULT_ROCKET_DAYS);
    state.service.rocket_history(days).await.map(Json).map_err(|e| {
        let err = anyhow::Error::new(e);
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "rocket history unavailable");
        StatusCode::SERVICE_UNAVAILABLE
    })
}

async fn get_investment_simulation(
    State(state): State<AppState>,
    Query(q): Query<RocketQuery>,
) -> Result<Json<InvestmentSimulation>, StatusCode> {
    let days = q.days.unwrap_or(DEFAULT_ROCKET_DAYS);
    state
        .service
        .investment_simulation(days)
        .await
        .map(Json)
        .map_err(|e| {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "investment simulation unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
