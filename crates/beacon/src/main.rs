//! Beacon server - Entry point

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use beacon::app;
use beacon_config::Environment;
use beacon_server::{CredentialResolver, ShutdownSignal};
use beacon_telemetry::init_logging;

/// Beacon gRPC server.
#[derive(Debug, Parser)]
#[command(name = "beacon-server", version = beacon::VERSION)]
struct Args {
    /// Path to a configuration file (TOML or JSON). Defaults to
    /// /etc/beacon-svc/beacon.toml when present.
    #[arg(short, long, env = "BEACON_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Beacon exited with error");
            eprintln!("beacon-server: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let loaded = app::load_config(args.config.as_deref()).context("loading configuration")?;
    let config = &loaded.config;
    init_logging(&config.logging_or_default().to_log_config(&config.name))
        .context("initializing logging")?;
    loaded.log_source();

    tracing::info!(version = beacon::VERSION, address = %config.listen_addr(), "Beacon starting");

    let env = Environment::from_env();
    let resolver = CredentialResolver::from_current_dir()?;
    let shutdown = ShutdownSignal::with_os_signals();

    let server = app::start(config, &env, &resolver).await?;
    app::run_until(&server, &shutdown, config).await?;

    Ok(())
}
