//! Beacon client - calls `Signal` on an interval and logs the reply.

use std::time::Duration;

use clap::Parser;
use tonic::transport::Endpoint;

use beacon::proto::grpcbeacon::v1::beacon_client::BeaconClient;
use beacon::proto::grpcbeacon::v1::SignalRequest;
use beacon_telemetry::{init_logging, LogConfig};

/// Polls a beacon server.
#[derive(Debug, Parser)]
#[command(name = "beacon-client", version = beacon::VERSION)]
struct Args {
    /// Server address, with or without scheme. Required.
    #[arg(long, env = "SERVER_ADDRESS")]
    server_address: String,

    /// Time between calls, such as `5s`, `500ms` or `1m30s`.
    #[arg(long, env = "CLIENT_INTERVAL", default_value = "5s", value_parser = parse_interval)]
    interval: Duration,
}

/// Parses a sequence of `<number><unit>` pairs; units are `h`, `m`, `s`,
/// `ms`, `us` and `ns`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_interval(input: &str) -> Result<Duration, String> {
    let mut rest = input.trim();
    if rest.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut nanos = 0.0_f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration '{input}'"))?;
        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number
            .parse()
            .map_err(|_| format!("invalid number in duration '{input}'"))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "h" => 3_600e9,
            "m" => 60e9,
            "s" => 1e9,
            "ms" => 1e6,
            "us" | "µs" => 1e3,
            "ns" => 1.0,
            other => return Err(format!("unknown unit '{other}' in duration '{input}'")),
        };

        nanos += value * scale;
        rest = tail;
    }

    // `as` saturates on overflow.
    let nanos = nanos.round() as u64;
    if nanos == 0 {
        return Err(format!("duration '{input}' must be positive"));
    }
    Ok(Duration::from_nanos(nanos))
}

fn endpoint(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

async fn signal_once(endpoint: &Endpoint) -> anyhow::Result<()> {
    let mut client = BeaconClient::new(endpoint.connect().await?);
    let response = client
        .signal(SignalRequest {
            message: "ping".to_string(),
        })
        .await?
        .into_inner();

    tracing::info!(reply = %response.reply, details = ?response.details, "Signal answered");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&LogConfig::development().with_service_name("beacon-client"))?;

    let endpoint = Endpoint::from_shared(endpoint(&args.server_address))?;
    let mut ticker = tokio::time::interval(args.interval);
    tracing::info!(endpoint = %endpoint.uri(), interval = ?args.interval, "Beacon client started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = signal_once(&endpoint).await {
                    tracing::warn!(endpoint = %endpoint.uri(), error = %e, "Signal failed");
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Beacon client stopped");
                return Ok(());
            }
        }
    }
}
