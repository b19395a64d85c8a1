//! Error types for the server lifecycle and its collaborators.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Boxed error carried by registration failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by [`ServerLifecycle`](crate::ServerLifecycle) and
/// [`RunningServer`](crate::RunningServer).
#[derive(Error, Debug)]
pub enum ServerError {
    /// `start` was called without any registrar.
    #[error("no grpc registrar found")]
    NoRegistrars,

    /// The address could not be resolved or the socket could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// The `host:port` that was requested.
        address: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A registrar failed to attach its handlers.
    #[error("registrar '{registrar}' failed")]
    Registration {
        /// Name of the failing registrar.
        registrar: String,
        /// What went wrong.
        #[source]
        source: RegistrationError,
    },

    /// Transport credentials could not be resolved or applied.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The transport rejected its configuration.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Graceful drain did not finish before the deadline.
    #[error("failed to stop server within {deadline:?}")]
    ShutdownTimeout {
        /// The deadline that elapsed.
        deadline: Duration,
    },
}

impl ServerError {
    /// Create a new bind error.
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            address: address.into(),
            source,
        }
    }

    /// Create a new registration error.
    pub fn registration(registrar: impl Into<String>, source: RegistrationError) -> Self {
        Self::Registration {
            registrar: registrar.into(),
            source,
        }
    }
}

/// Failure of a single registrar.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// The module that should have registered was never constructed.
    #[error("receiver is nil")]
    NilReceiver,

    /// The registrar ran and failed.
    #[error("{0}")]
    Failed(#[source] BoxError),
}

impl RegistrationError {
    /// Wraps any error as a registration failure.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        Self::Failed(err.into())
    }
}

/// Errors resolving TLS material from configured paths.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// A configured path was empty.
    #[error("invalid {field} path: path is empty")]
    InvalidPath {
        /// Which path was empty ("key" or "cert").
        field: &'static str,
    },

    /// A configured path does not exist.
    #[error("file does not exist: {}", path.display())]
    PathNotFound {
        /// The absolute path that was checked.
        path: PathBuf,
    },

    /// A configured path is a directory.
    #[error("file is a directory: {}", path.display())]
    NotAFile {
        /// The absolute path that was checked.
        path: PathBuf,
    },

    /// The path could not be inspected or read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The files were read but do not form a usable identity.
    #[error("failed to create credentials: {0}")]
    CredentialLoad(String),
}

impl CredentialError {
    /// Create a new I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors answering health queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HealthError {
    /// The queried service name is not recognized.
    #[error("service {name} not found")]
    NotFound {
        /// The rejected name, verbatim.
        name: String,
    },

    /// The watch consumer went away before the status was delivered.
    #[error("Stream has ended.")]
    StreamClosed,
}

impl From<HealthError> for tonic::Status {
    fn from(err: HealthError) -> Self {
        match err {
            HealthError::NotFound { .. } => Self::not_found(err.to_string()),
            HealthError::StreamClosed => Self::cancelled(err.to_string()),
        }
    }
}

/// Result type for lifecycle operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let source = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err = ServerError::bind("127.0.0.1:8080", source);
        assert_eq!(
            err.to_string(),
            "failed to bind 127.0.0.1:8080: address in use"
        );
    }

    #[test]
    fn test_registration_error_source() {
        let err = ServerError::registration("beacon", RegistrationError::NilReceiver);
        assert_eq!(err.to_string(), "registrar 'beacon' failed");

        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("receiver is nil"));
    }

    #[test]
    fn test_shutdown_timeout_display() {
        let err = ServerError::ShutdownTimeout {
            deadline: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "failed to stop server within 10s");
    }

    #[test]
    fn test_credential_error_messages() {
        let err = CredentialError::PathNotFound {
            path: PathBuf::from("/etc/beacon/server.crt"),
        };
        assert_eq!(err.to_string(), "file does not exist: /etc/beacon/server.crt");

        let err = CredentialError::NotAFile {
            path: PathBuf::from("/etc/beacon"),
        };
        assert_eq!(err.to_string(), "file is a directory: /etc/beacon");

        let err = CredentialError::InvalidPath { field: "key" };
        assert!(err.to_string().contains("key"));
    }

    #[test]
    fn test_health_not_found_status() {
        let status: tonic::Status = HealthError::NotFound {
            name: "nope".to_string(),
        }
        .into();
        assert_eq!(status.code(), tonic::Code::NotFound);
        assert_eq!(status.message(), "service nope not found");
    }

    #[test]
    fn test_health_stream_closed_status() {
        let status: tonic::Status = HealthError::StreamClosed.into();
        assert_eq!(status.code(), tonic::Code::Cancelled);
        assert_eq!(status.message(), "Stream has ended.");
    }

    #[test]
    fn test_failed_wraps_any_error() {
        let err = RegistrationError::failed("duplicate route");
        assert_eq!(err.to_string(), "duplicate route");
    }
}
