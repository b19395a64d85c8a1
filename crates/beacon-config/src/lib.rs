//! Typed configuration for the beacon service host.
//!
//! This crate provides:
//! - [`BeaconConfig`], the service configuration with its `[logging]` and
//!   `[tls]` sections
//! - [`ConfigLoader`], layering defaults, a TOML or JSON file and
//!   `BEACON__*` environment overrides
//! - [`Environment`], the `HOSTNAME` / `DEPLOYMENT_GROUP` values read at startup
//!
//! # Configuration File Format
//!
//! ```toml
//! name = "red cliff"
//! address = "127.0.0.1"
//! port = 8080
//! shutdown_timeout_secs = 10
//!
//! [logging]
//! development = false
//!
//! [tls]
//! enabled = true
//! key_file_path = "certs/server.key"
//! cert_file_path = "certs/server.crt"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `BEACON__NAME`, `BEACON__ADDRESS`, `BEACON__PORT`,
//!   `BEACON__SHUTDOWN_TIMEOUT_SECS`
//! - `BEACON__LOGGING__DEVELOPMENT`
//! - `BEACON__TLS__ENABLED`, `BEACON__TLS__KEY_FILE_PATH`,
//!   `BEACON__TLS__CERT_FILE_PATH`

#![warn(missing_docs)]

mod config;
mod environment;
mod error;
mod loader;
mod schema;

pub use config::BeaconConfig;
pub use environment::Environment;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_CONFIG_PATH, DEFAULT_ENV_PREFIX};
pub use schema::{LoggingConfig, TlsConfig};
