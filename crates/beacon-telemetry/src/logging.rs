//! Structured logging for beacon.
//!
//! Two presets mirror the usual split between a developer workstation and a
//! deployed service:
//!
//! - [`LogConfig::development`]: `debug` level, human-readable output with
//!   span events and source locations
//! - [`LogConfig::production`]: `info` level, one JSON object per line
//!
//! `RUST_LOG`, when set, takes precedence over the configured level.
//!
//! # Example
//!
//! ```rust,ignore
//! use beacon_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(registrar = "health", "Registering service");
//! ```

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// How and how much the process logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Install a subscriber at all.
    pub enabled: bool,

    /// Filter directive, e.g. `"info"` or `"beacon_server=debug,warn"`.
    pub level: String,

    /// One JSON object per event instead of the pretty multi-line format.
    pub json_format: bool,

    /// Emit an event when a span opens and closes.
    pub span_events: bool,

    /// Record source file and line.
    pub file_line_info: bool,

    /// Record the emitting thread.
    pub thread_ids: bool,

    /// Record the module path of the event.
    pub include_target: bool,

    /// Reported once when logging comes up.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Debug level, pretty output, span events and source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            ..Self::production()
        }
    }

    /// Info level, JSON lines.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            service_name: "beacon".to_string(),
        }
    }

    /// Replaces the reported service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Filter for [`level`](Self::level) alone; `RUST_LOG` is not consulted.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::LoggingInit` for an unparsable directive.
    pub fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        create_env_filter(&self.level)
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_span_events(span_events)
            .with_file(self.file_line_info)
            .with_line_number(self.file_line_info)
            .with_thread_ids(self.thread_ids)
            .with_target(self.include_target);

        if self.json_format {
            layer.json().boxed()
        } else {
            layer.pretty().boxed()
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// A no-op when `config.enabled` is false. Only one global subscriber can
/// exist per process, so a second call fails.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidConfig` for an empty service name, or
/// `TelemetryError::LoggingInit` if the filter is invalid or a subscriber is
/// already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }
    if config.service_name.trim().is_empty() {
        return Err(TelemetryError::InvalidConfig(
            "service name is empty".to_string(),
        ));
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => config.env_filter()?,
    };

    tracing_subscriber::registry()
        .with(config.fmt_layer().with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::debug!(
        service.name = %config.service_name,
        json = config.json_format,
        "Logging initialized"
    );

    Ok(())
}

/// Parses a filter directive.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` naming the bad directive.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("invalid filter '{filter}': {e}")))
}
