use thiserror::Error;

/// Failure taxonomy shared by providers, analysis and storage.
///
/// Only `Configuration` is fatal. Everything else is recovered at the
/// boundary of a single analysis unit or a single persistence call.
#[derive(Error, Debug)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient data: need {needed} bars, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("timed out after {timeout_secs}s: {operation}")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Error::UpstreamUnavailable(message.into())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Configuration(message.into())
    }

    /// Transient upstream failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::UpstreamUnavailable(_) | Error::Timeout { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::UpstreamUnavailable(err.to_string())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::StoreUnavailable(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Error::StoreUnavailable(format!("migrations failed: {err}"))
    }
}
