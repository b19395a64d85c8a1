//! # beacon-server
//!
//! Minimal gRPC service host: the pieces a service binary needs around its own
//! handlers.
//!
//! - [`ServerLifecycle`] / [`RunningServer`]: register, bind, serve, drain
//! - [`ServiceRegistrar`]: how a module attaches handlers to the server
//! - [`CredentialResolver`]: `[tls]` settings to a transport identity
//! - [`HealthState`] / [`HealthService`]: static `grpc.health.v1` table
//! - [`ReflectionService`]: `grpc.reflection.v1` over registered descriptors
//! - [`metadata`]: peer identity from forwarded client-cert metadata
//! - [`ShutdownSignal`]: trigger and await graceful shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use beacon_server::{
//!     CredentialResolver, HealthService, HealthState, ServerLifecycle, ServerOptions,
//!     ShutdownSignal,
//! };
//! use std::time::Duration;
//!
//! let credential = CredentialResolver::from_current_dir()?.resolve(tls.as_ref())?;
//! let options = ServerOptions::builder().credential(credential).build();
//!
//! let server = ServerLifecycle::new("127.0.0.1", 8080)
//!     .options(options)
//!     .registrar(HealthService::new(HealthState::new(["Beacon"])))
//!     .registrar(beacon_registrar)
//!     .start()
//!     .await?;
//!
//! ShutdownSignal::with_os_signals().recv().await;
//! server.stop(Duration::from_secs(10)).await?;
//! ```

mod error;
mod health;
mod lifecycle;
pub mod metadata;
mod options;
mod reflection;
mod registrar;
mod shutdown;
mod tls;

pub use error::{
    BoxError, CredentialError, HealthError, RegistrationError, ServerError, ServerResult,
};
pub use health::{HealthService, HealthState, HealthStatus, HealthWatchStream, BUILTIN_SERVICES};
pub use lifecycle::{LifecycleState, RunningServer, ServeOutcome, ServerLifecycle, Stopped};
pub use options::{ServerOptions, ServerOptionsBuilder};
pub use reflection::ReflectionService;
pub use registrar::{registrar_fn, FnRegistrar, ServiceRegistrar};
pub use shutdown::ShutdownSignal;
pub use tls::{CredentialResolver, ServerCredential, TlsSettings};
