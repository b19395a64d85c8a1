//! Error types for the beacon application.

use thiserror::Error;

use beacon_config::ConfigError;
use beacon_server::{CredentialError, ServerError};
use beacon_telemetry::TelemetryError;

/// Anything that can stop the beacon from starting or stopping cleanly.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be initialized.
    #[error("logging error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// TLS credentials could not be resolved.
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    /// The server failed to start or stop.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// The server stopped without being asked to.
    #[error("server stopped unexpectedly: {reason}")]
    UnexpectedStop {
        /// What the serve loop reported.
        reason: String,
    },
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_wraps_server_error() {
        let err: AppError = ServerError::ShutdownTimeout {
            deadline: Duration::from_secs(10),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "server error: failed to stop server within 10s"
        );
    }

    #[test]
    fn test_wraps_config_error() {
        let err: AppError = ConfigError::validation_error("port must be non-zero").into();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().starts_with("configuration error"));
    }
}
