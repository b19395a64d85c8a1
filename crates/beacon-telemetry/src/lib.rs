//! Logging setup for the beacon service host.
//!
//! Every beacon binary installs exactly one global `tracing` subscriber at
//! startup. The subscriber is chosen by [`LogConfig`]: JSON lines for deployed
//! services, pretty multi-line output for local development.
//!
//! # Example
//!
//! ```rust,ignore
//! use beacon_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production().with_service_name("red cliff"))?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
