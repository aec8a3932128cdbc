pub mod analysis;
pub mod briefing;
pub mod cache;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod rocket;
pub mod schedule;
pub mod storage;
pub mod time;

pub use error::{Error, Result};

pub mod config {
    use anyhow::Context;
    use chrono::NaiveTime;
    use std::path::PathBuf;
    use std::time::Duration;

    const DEFAULT_UNIVERSE_PATH: &str = "config/nordpuls.json";
    const DEFAULT_UTC_OFFSET_MINUTES: i32 = 60;
    const DEFAULT_CONCURRENCY: usize = 12;
    const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 20;
    const DEFAULT_PROVIDER_RETRIES: u32 = 3;
    const DEFAULT_CACHE_TTL_SECS: u64 = 30 * 60;
    const DEFAULT_TOP_N: usize = 2;
    const DEFAULT_MORNING_AT: &str = "08:15";
    const DEFAULT_EVENING_AT: &str = "17:15";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub universe_path: PathBuf,
        pub market_data_base_url: Option<String>,
        pub disclosure_api_url: Option<String>,
        pub disclosure_api_key: Option<String>,
        pub market_utc_offset_minutes: i32,
        pub analysis_concurrency: usize,
        pub provider_timeout: Duration,
        pub provider_retries: u32,
        pub cache_ttl: Duration,
        pub rocket_top_n: usize,
        pub morning_at: NaiveTime,
        pub evening_at: NaiveTime,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let morning_at = parse_time_of_day(
                "MORNING_BRIEFING_AT",
                std::env::var("MORNING_BRIEFING_AT").ok(),
                DEFAULT_MORNING_AT,
            )?;
            let evening_at = parse_time_of_day(
                "EVENING_BRIEFING_AT",
                std::env::var("EVENING_BRIEFING_AT").ok(),
                DEFAULT_EVENING_AT,
            )?;
            anyhow::ensure!(
                morning_at < evening_at,
                "MORNING_BRIEFING_AT ({morning_at}) must be earlier than EVENING_BRIEFING_AT ({evening_at})"
            );

            let analysis_concurrency = env_parse("ANALYSIS_CONCURRENCY", DEFAULT_CONCURRENCY);
            anyhow::ensure!(
                analysis_concurrency >= 1,
                "ANALYSIS_CONCURRENCY must be >= 1"
            );

            let rocket_top_n = env_parse("ROCKET_TOP_N", DEFAULT_TOP_N);
            anyhow::ensure!(rocket_top_n >= 1, "ROCKET_TOP_N must be >= 1");

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                universe_path: std::env::var("NORDPULS_CONFIG")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_UNIVERSE_PATH)),
                market_data_base_url: std::env::var("MARKET_DATA_BASE_URL").ok(),
                disclosure_api_url: std::env::var("DISCLOSURE_API_URL").ok(),
                disclosure_api_key: std::env::var("DISCLOSURE_API_KEY").ok(),
                market_utc_offset_minutes: env_parse(
                    "MARKET_UTC_OFFSET_MINUTES",
                    DEFAULT_UTC_OFFSET_MINUTES,
                ),
                analysis_concurrency,
                provider_timeout: Duration::from_secs(env_parse(
                    "PROVIDER_TIMEOUT_SECS",
                    DEFAULT_PROVIDER_TIMEOUT_SECS,
                )),
                provider_retries: env_parse("PROVIDER_RETRIES", DEFAULT_PROVIDER_RETRIES),
                cache_ttl: Duration::from_secs(env_parse("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)),
                rocket_top_n,
                morning_at,
                evening_at,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }
    }

    fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
        std::env::var(key)
            .ok()
            .and_then(|s| s.trim().parse::<T>().ok())
            .unwrap_or(default)
    }

    fn parse_time_of_day(
        key: &str,
        value: Option<String>,
        default: &str,
    ) -> anyhow::Result<NaiveTime> {
        let raw = value.unwrap_or_else(|| default.to_string());
        NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .with_context(|| format!("{key} must be HH:MM (got {raw:?})"))
    }

}
