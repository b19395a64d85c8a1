//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Why a beacon configuration could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file is missing.
    #[error("config file {path} does not exist")]
    FileNotFound {
        /// Absolute path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read config file {path}")]
    ReadError {
        /// Absolute path of the file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML, or a key the schema does not know.
    #[error("bad TOML config: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Malformed JSON, or a key the schema does not know.
    #[error("bad JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A field parsed but holds an unusable value.
    #[error("config field '{field}' {reason}")]
    InvalidValue {
        /// Field name as written in the file.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override variable could not be parsed.
    #[error("env override {var}: {reason}")]
    EnvParseError {
        /// Full variable name, prefix included.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// Anything else that makes the input unusable, such as an unsupported
    /// format.
    #[error("config rejected: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// `FileNotFound` for `path`.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// `ReadError` for `path`.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// `InvalidValue` for `field`.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// `EnvParseError` for `var`.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// `ValidationError` with `message`.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_names_path() {
        let err = ConfigError::file_not_found("/etc/beacon-svc/beacon.toml");
        assert_eq!(
            err.to_string(),
            "config file /etc/beacon-svc/beacon.toml does not exist"
        );
    }

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::invalid_value("port", "must be non-zero");
        assert_eq!(err.to_string(), "config field 'port' must be non-zero");
    }

    #[test]
    fn test_env_parse_display() {
        let err = ConfigError::env_parse_error("BEACON__TLS__ENABLED", "expected boolean");
        assert_eq!(
            err.to_string(),
            "env override BEACON__TLS__ENABLED: expected boolean"
        );
    }

    #[test]
    fn test_read_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::read_error("/etc/beacon-svc/beacon.toml", io);
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("denied"));
    }

    #[test]
    fn test_toml_error_from() {
        let parse_err = toml::from_str::<toml::Value>("name = ").unwrap_err();
        let err: ConfigError = parse_err.into();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }
}
