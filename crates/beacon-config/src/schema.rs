//! Configuration section types.

use beacon_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// `[logging]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Human-readable debug output instead of production JSON.
    #[serde(default, alias = "Development")]
    pub development: bool,
}

impl LoggingConfig {
    /// Maps this section onto a logging preset for `service_name`.
    ///
    /// # Example
    ///
    /// ```
    /// use beacon_config::LoggingConfig;
    ///
    /// let log = LoggingConfig { development: true }.to_log_config("red cliff");
    /// assert_eq!(log.level, "debug");
    /// assert_eq!(log.service_name, "red cliff");
    /// ```
    #[must_use]
    pub fn to_log_config(&self, service_name: &str) -> LogConfig {
        let preset = if self.development {
            LogConfig::development()
        } else {
            LogConfig::production()
        };
        preset.with_service_name(service_name)
    }
}

/// `[tls]` section.
///
/// Paths may be relative; they are resolved against the working directory at
/// startup, not at load time.
///
/// # Example
///
/// ```
/// use beacon_config::TlsConfig;
///
/// let tls = TlsConfig {
///     enabled: true,
///     key_file_path: "certs/server.key".to_string(),
///     cert_file_path: "certs/server.crt".to_string(),
/// };
/// assert!(tls.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    /// Whether the listener serves TLS.
    #[serde(default, alias = "Enabled")]
    pub enabled: bool,

    /// PEM private key path.
    #[serde(default, alias = "KeyFilePath")]
    pub key_file_path: String,

    /// PEM certificate chain path.
    #[serde(default, alias = "CertFilePath")]
    pub cert_file_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_logging_by_default() {
        let log = LoggingConfig::default().to_log_config("red cliff");
        assert_eq!(log.level, "info");
        assert!(log.json_format);
        assert_eq!(log.service_name, "red cliff");
    }

    #[test]
    fn test_tls_section_defaults() {
        let tls: TlsConfig = toml::from_str("enabled = true").unwrap();
        assert!(tls.enabled);
        assert!(tls.key_file_path.is_empty());
        assert!(tls.cert_file_path.is_empty());
    }

    #[test]
    fn test_camel_case_keys_accepted() {
        let tls: TlsConfig = toml::from_str(
            r#"
            Enabled = true
            KeyFilePath = "server.key"
            CertFilePath = "server.crt"
            "#,
        )
        .unwrap();
        assert!(tls.enabled);
        assert_eq!(tls.key_file_path, "server.key");
        assert_eq!(tls.cert_file_path, "server.crt");

        let logging: LoggingConfig = toml::from_str("Development = true").unwrap();
        assert!(logging.development);
    }

    #[test]
    fn test_tls_section_rejects_unknown_fields() {
        let result: Result<TlsConfig, _> = toml::from_str("ca_file_path = \"ca.pem\"");
        assert!(result.is_err());
    }
}
