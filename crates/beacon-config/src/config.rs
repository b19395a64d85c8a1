//! Top-level configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LoggingConfig, TlsConfig};

/// Complete beacon service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from a file and
/// environment overrides.
///
/// # Example
///
/// ```
/// use beacon_config::BeaconConfig;
///
/// let config = BeaconConfig::default();
/// assert_eq!(config.name, "red cliff");
/// assert_eq!(config.port, 8080);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BeaconConfig {
    /// Beacon name reported in every signal reply.
    #[serde(default = "default_name")]
    pub name: String,

    /// Host or IP the listener binds to.
    #[serde(default = "default_address")]
    pub address: String,

    /// Listener port. `0` asks the OS for an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deadline for graceful drain after a shutdown signal.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Logging section. Absent means production logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// TLS section. Absent means plaintext.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            address: default_address(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            logging: None,
            tls: None,
        }
    }
}

fn default_name() -> String {
    "red cliff".to_string()
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> u64 {
    10
}

impl BeaconConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `name` or `address` is empty
    /// - `port` is 0
    /// - `shutdown_timeout_secs` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid_value("name", "must not be empty"));
        }

        if self.address.trim().is_empty() {
            return Err(ConfigError::invalid_value("address", "must not be empty"));
        }

        if self.port == 0 {
            return Err(ConfigError::invalid_value(
                "port",
                "must be between 1 and 65535",
            ));
        }

        if self.shutdown_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "shutdown_timeout_secs",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Graceful drain deadline.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Logging section, falling back to production defaults.
    #[must_use]
    pub fn logging_or_default(&self) -> LoggingConfig {
        self.logging.unwrap_or_default()
    }

    /// `host:port` form of the bind address, bracketing IPv6 literals.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}
