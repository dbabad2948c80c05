use serde::Serialize;
use thiserror::Error;

/// Failure kinds surfaced by a schedule fetch.
///
/// The fetcher classifies its own failures into one of these; the session
/// only stores and forwards the kind. Every kind is recoverable via `retry()`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleError {
    /// Remote responded with a non-success status.
    #[error("HTTP error {code}")]
    Http { code: u16, body: Option<String> },

    /// Transport-level failure, no response was received.
    #[error("Network error")]
    Network,

    /// Success status but the payload could not be decoded.
    #[error("API error: {message}")]
    Api { message: String },

    #[error("Unknown error: {cause}")]
    Unknown { cause: String },
}

impl ScheduleError {
    /// Map an arbitrary fetch failure onto the taxonomy.
    ///
    /// Errors that already are a `ScheduleError` pass through untouched,
    /// everything else becomes `Unknown`.
    pub fn classify(err: anyhow::Error) -> Self {
        match err.downcast::<ScheduleError>() {
            Ok(kind) => kind,
            Err(other) => ScheduleError::Unknown {
                cause: other.to_string(),
            },
        }
    }
}

/// Invalid environment configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}
