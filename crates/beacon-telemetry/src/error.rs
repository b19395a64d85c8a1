//! Telemetry error types.

use thiserror::Error;

/// Logging could not be brought up.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The subscriber or its filter could not be installed.
    #[error("logging init failed: {0}")]
    LoggingInit(String),

    /// The [`LogConfig`](crate::LogConfig) itself is unusable.
    #[error("invalid logging config: {0}")]
    InvalidConfig(String),
}
