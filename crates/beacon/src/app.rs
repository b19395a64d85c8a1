//! Composition root.
//!
//! Builds everything the beacon needs in dependency order: configuration,
//! logging, TLS credential, registrars, lifecycle.

use std::path::{Path, PathBuf};

use beacon_config::{BeaconConfig, ConfigLoader, Environment, TlsConfig, DEFAULT_CONFIG_PATH};
use beacon_server::{
    CredentialResolver, HealthService, HealthState, ReflectionService, RunningServer,
    ServeOutcome, ServerLifecycle, ServerOptions, ShutdownSignal, TlsSettings,
};

use crate::error::{AppError, AppResult};
use crate::proto::descriptor;
use crate::service::{BeaconService, HEALTH_NAMES};

/// Configuration plus the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Effective configuration, overrides applied.
    pub config: BeaconConfig,
    /// File read, or `None` when running on defaults.
    pub source: Option<PathBuf>,
}

impl LoadedConfig {
    /// Logs where the configuration came from. Call once logging is up.
    pub fn log_source(&self) {
        match &self.source {
            Some(source) => tracing::info!(path = %source.display(), "Configuration file loaded"),
            None => tracing::info!("No configuration file, using defaults"),
        }
    }
}

/// Loads configuration from `path`, or from the default location if present.
///
/// An explicit path must exist. Without one, a missing
/// [`DEFAULT_CONFIG_PATH`] falls back to the built-in defaults. Environment
/// overrides (`BEACON__*`, `.env`) apply either way.
///
/// # Errors
///
/// Returns `AppError::Config` if the file cannot be read, parsed or
/// validated.
pub fn load_config(path: Option<&Path>) -> AppResult<LoadedConfig> {
    let loader = ConfigLoader::new().with_dotenv();
    let loader = match path {
        Some(path) => loader.with_file(path)?,
        None => loader.with_optional_file(DEFAULT_CONFIG_PATH)?,
    };

    let source = loader.source().map(Path::to_path_buf);
    let config = loader
        .with_env_prefix(beacon_config::DEFAULT_ENV_PREFIX)
        .load()?;
    Ok(LoadedConfig { config, source })
}

/// Converts the `[tls]` section into server TLS settings.
pub fn tls_settings(tls: &TlsConfig) -> TlsSettings {
    TlsSettings {
        enabled: tls.enabled,
        key_file_path: tls.key_file_path.clone(),
        cert_file_path: tls.cert_file_path.clone(),
    }
}

/// Builds and starts the server: health, the beacon service and reflection
/// over both.
///
/// # Errors
///
/// Returns `AppError::Credential` if TLS is enabled but unusable, or
/// `AppError::Server` if the server cannot start.
pub async fn start(
    config: &BeaconConfig,
    env: &Environment,
    resolver: &CredentialResolver,
) -> AppResult<RunningServer> {
    let tls = config.tls.as_ref().map(tls_settings);
    let credential = resolver.resolve(tls.as_ref())?;
    let options = ServerOptions::builder().credential(credential).build();

    let beacon = BeaconService::new(env, &config.name);
    let health = HealthService::new(HealthState::new(HEALTH_NAMES));
    let reflection = ReflectionService::new()
        .with_health()
        .file_descriptor_set(descriptor::file_descriptor_set());

    tracing::info!(
        name = %config.name,
        host_name = %env.host_name,
        deployment_group = env.deployment_group.as_deref(),
        "Starting beacon"
    );

    let server = ServerLifecycle::new(&config.address, config.port)
        .options(options)
        .registrar(health)
        .registrar(beacon.registrar())
        .registrar(reflection)
        .start()
        .await?;

    Ok(server)
}

/// Serves until `shutdown` fires or the server stops on its own, then drains
/// within the configured timeout.
///
/// # Errors
///
/// Returns `AppError::UnexpectedStop` if the server ended without being
/// asked, or `AppError::Server` if the drain exceeded its deadline.
pub async fn run_until(
    server: &RunningServer,
    shutdown: &ShutdownSignal,
    config: &BeaconConfig,
) -> AppResult<()> {
    let stopped = server.stopped();

    tokio::select! {
        () = shutdown.recv() => {
            tracing::info!("Shutdown requested");
        }
        outcome = stopped.wait() => {
            if let ServeOutcome::Failed(reason) = outcome {
                return Err(AppError::UnexpectedStop { reason });
            }
        }
    }

    server.stop(config.shutdown_timeout()).await?;
    tracing::info!("Beacon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_tls_settings_copy_fields() {
        let tls = TlsConfig {
            enabled: true,
            key_file_path: "server.key".to_string(),
            cert_file_path: "server.crt".to_string(),
        };
        assert_eq!(
            tls_settings(&tls),
            TlsSettings::enabled("server.key", "server.crt")
        );
    }

    #[test]
    fn test_load_config_from_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "name = \"blue lake\"\nport = 9090").unwrap();

        let loaded = load_config(Some(file.path())).unwrap();
        assert_eq!(loaded.config.name, "blue lake");
        assert_eq!(loaded.config.port, 9090);

        let source = loaded.source.expect("explicit file is the source");
        assert_eq!(source.file_name(), file.path().file_name());
    }

    #[test]
    fn test_load_config_missing_explicit_file() {
        let err = load_config(Some(Path::new("/nonexistent/beacon.toml"))).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let config = BeaconConfig {
            port: 0,
            ..BeaconConfig::default()
        };
        let env = Environment::default();
        let resolver = CredentialResolver::new("/nonexistent");

        let server = start(&config, &env, &resolver).await.unwrap();
        assert_eq!(server.registrars(), ["health", "beacon", "reflection"]);

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        run_until(&server, &shutdown, &config).await.unwrap();
        assert!(server.stopped().has_fired());
    }

    #[tokio::test]
    async fn test_start_with_missing_tls_files() {
        let config = BeaconConfig {
            port: 0,
            tls: Some(TlsConfig {
                enabled: true,
                key_file_path: "server.key".to_string(),
                cert_file_path: "server.crt".to_string(),
            }),
            ..BeaconConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let resolver = CredentialResolver::new(dir.path());

        let err = start(&config, &Environment::default(), &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Credential(_)));
    }
}
