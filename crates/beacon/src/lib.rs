//! # beacon
//!
//! A demo gRPC service hosted on [`beacon_server`]: `grpcbeacon.v1.Beacon`
//! answers `Signal` with a timestamp and host details, next to the standard
//! `grpc.health.v1` service.
//!
//! The crate ships two binaries:
//!
//! - `beacon-server`: loads configuration, starts the server and drains it on
//!   SIGINT/SIGTERM
//! - `beacon-client`: calls `Signal` on an interval and logs the reply

pub mod app;
pub mod error;
pub mod proto;
pub mod service;

pub use error::{AppError, AppResult};
pub use service::BeaconService;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
