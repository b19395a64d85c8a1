//! Server lifecycle: register, bind, serve, drain.
//!
//! [`ServerLifecycle`] collects registrars and transport options, then
//! [`start`](ServerLifecycle::start)s in a fixed order:
//!
//! 1. refuse an empty registrar list
//! 2. run every registrar, stopping at the first failure
//! 3. apply transport options (TLS, limits)
//! 4. bind the listener
//! 5. spawn the serve loop and return a [`RunningServer`]
//!
//! Registration happens before binding, so a failed registrar never exposes
//! a port. [`RunningServer::stop`] triggers a graceful drain and races it
//! against a deadline; on timeout the drain keeps running in the background.
//!
//! # Example
//!
//! ```rust,ignore
//! use beacon_server::{HealthService, HealthState, ServerLifecycle};
//! use std::time::Duration;
//!
//! let server = ServerLifecycle::new("127.0.0.1", 8080)
//!     .registrar(HealthService::new(HealthState::default()))
//!     .start()
//!     .await?;
//!
//! server.stop(Duration::from_secs(10)).await?;
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::service::RoutesBuilder;

use crate::error::{ServerError, ServerResult};
use crate::options::ServerOptions;
use crate::registrar::ServiceRegistrar;
use crate::shutdown::ShutdownSignal;

/// Lifecycle states. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    /// No socket yet.
    Unbound = 0,
    /// Listener bound, serve loop not yet running.
    Bound = 1,
    /// Accepting and serving calls.
    Serving = 2,
    /// Stop requested, finishing in-flight calls.
    Draining = 3,
    /// Serve loop has returned.
    Stopped = 4,
}

impl LifecycleState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Unbound,
            1 => Self::Bound,
            2 => Self::Serving,
            3 => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unbound => "unbound",
            Self::Bound => "bound",
            Self::Serving => "serving",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
struct StateCell(Arc<AtomicU8>);

impl StateCell {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(LifecycleState::Unbound as u8)))
    }

    fn advance(&self, to: LifecycleState) {
        self.0.fetch_max(to as u8, Ordering::SeqCst);
    }

    fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.0.load(Ordering::SeqCst))
    }
}

/// How the serve loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// Drained after a stop request.
    Graceful,
    /// Ended on its own: a transport error or an unexpected exit.
    Failed(String),
}

impl ServeOutcome {
    /// Whether the loop ended because stop was requested.
    #[must_use]
    pub fn is_graceful(&self) -> bool {
        matches!(self, Self::Graceful)
    }
}

/// One-shot signal that fires when the serve loop returns.
#[derive(Debug, Clone)]
pub struct Stopped {
    receiver: watch::Receiver<Option<ServeOutcome>>,
}

impl Stopped {
    /// The outcome, if the loop has already returned.
    #[must_use]
    pub fn outcome(&self) -> Option<ServeOutcome> {
        self.receiver.borrow().clone()
    }

    /// Whether the loop has returned.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.receiver.borrow().is_some()
    }

    /// Waits for the loop to return.
    #[allow(clippy::let_and_return)]
    pub async fn wait(&self) -> ServeOutcome {
        let mut receiver = self.receiver.clone();
        let outcome = match receiver.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome)
                .clone()
                .unwrap_or_else(|| ServeOutcome::Failed("serve loop reported nothing".into())),
            Err(_) => ServeOutcome::Failed("serve task ended without reporting".into()),
        };
        outcome
    }
}

/// Collects registrars and options, then starts the server.
#[must_use]
pub struct ServerLifecycle {
    bind_address: String,
    port: u16,
    options: ServerOptions,
    registrars: Vec<Box<dyn ServiceRegistrar>>,
}

impl fmt::Debug for ServerLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerLifecycle")
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("options", &self.options)
            .field(
                "registrars",
                &self.registrars.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ServerLifecycle {
    /// Lifecycle that will listen on `bind_address:port`.
    ///
    /// `bind_address` may be an IP literal or a host name. Port `0` picks an
    /// ephemeral port; read it back with [`RunningServer::local_addr`].
    pub fn new(bind_address: impl Into<String>, port: u16) -> Self {
        Self {
            bind_address: bind_address.into(),
            port,
            options: ServerOptions::default(),
            registrars: Vec::new(),
        }
    }

    /// Sets transport options.
    pub fn options(mut self, options: ServerOptions) -> Self {
        self.options = options;
        self
    }

    /// Appends one registrar. Order only affects log order.
    pub fn registrar(mut self, registrar: impl ServiceRegistrar + 'static) -> Self {
        self.registrars.push(Box::new(registrar));
        self
    }

    /// Appends several boxed registrars.
    pub fn registrars(
        mut self,
        registrars: impl IntoIterator<Item = Box<dyn ServiceRegistrar>>,
    ) -> Self {
        self.registrars.extend(registrars);
        self
    }

    /// `host:port` the listener will bind.
    #[must_use]
    pub fn address(&self) -> String {
        if self.bind_address.contains(':') && !self.bind_address.starts_with('[') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }

    /// Registers every service, binds the listener and starts serving.
    ///
    /// Returns once the listener is bound; serving continues on a spawned
    /// task. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - `NoRegistrars` if no registrar was added
    /// - `Registration` for the first registrar that fails; later ones are
    ///   not attempted and nothing is bound
    /// - `Transport` if the transport rejects the TLS identity
    /// - `Bind` if the address cannot be resolved or is in use
    pub async fn start(self) -> ServerResult<RunningServer> {
        if self.registrars.is_empty() {
            return Err(ServerError::NoRegistrars);
        }

        let state = StateCell::new();
        let address = self.address();

        let mut routes = RoutesBuilder::default();
        for registrar in &self.registrars {
            tracing::info!(registrar = registrar.name(), "Registering service");
            registrar
                .register(&mut routes)
                .map_err(|e| ServerError::registration(registrar.name(), e))?;
        }

        let mut server = self.options.server()?;

        let listener = TcpListener::bind(address.as_str())
            .await
            .map_err(|e| ServerError::bind(&address, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::bind(&address, e))?;
        state.advance(LifecycleState::Bound);

        let registrar_names: Vec<String> = self
            .registrars
            .iter()
            .map(|r| r.name().to_string())
            .collect();

        tracing::info!(
            address = %local_addr,
            registrars = ?registrar_names,
            tls = self.options.credential().is_some(),
            "gRPC server listening"
        );

        let router = server.add_routes(routes.routes());
        let shutdown = ShutdownSignal::new();
        let (stopped_tx, stopped_rx) = watch::channel(None);

        state.advance(LifecycleState::Serving);
        tokio::spawn({
            let shutdown = shutdown.clone();
            let state = state.clone();
            async move {
                let incoming = TcpListenerStream::new(listener);
                let result = router
                    .serve_with_incoming_shutdown(incoming, shutdown.recv())
                    .await;

                let outcome = match result {
                    Ok(()) if shutdown.is_shutdown() => ServeOutcome::Graceful,
                    Ok(()) => ServeOutcome::Failed("serve loop exited unexpectedly".to_string()),
                    Err(e) => ServeOutcome::Failed(e.to_string()),
                };

                state.advance(LifecycleState::Stopped);
                match &outcome {
                    ServeOutcome::Graceful => {
                        tracing::info!(address = %local_addr, "gRPC server stopped");
                    }
                    ServeOutcome::Failed(reason) => {
                        tracing::error!(address = %local_addr, %reason, "gRPC server failed");
                    }
                }
                stopped_tx.send_replace(Some(outcome));
            }
        });

        Ok(RunningServer {
            local_addr,
            registrars: registrar_names,
            shutdown,
            state,
            stopped: Stopped {
                receiver: stopped_rx,
            },
        })
    }
}

/// Handle to a started server.
///
/// Dropping the handle does not stop the server.
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    registrars: Vec<String>,
    shutdown: ShutdownSignal,
    state: StateCell,
    stopped: Stopped,
}

impl RunningServer {
    /// Address the listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Registrar names, in registration order.
    #[must_use]
    pub fn registrars(&self) -> &[String] {
        &self.registrars
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Signal that fires once the serve loop returns.
    #[must_use]
    pub fn stopped(&self) -> Stopped {
        self.stopped.clone()
    }

    /// Requests a graceful drain and waits up to `deadline` for it.
    ///
    /// Safe to call more than once and after the loop has already ended.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ShutdownTimeout` if the drain is still running
    /// when `deadline` elapses. The drain is not cancelled.
    pub async fn stop(&self, deadline: Duration) -> ServerResult<()> {
        if self.shutdown.trigger() {
            self.state.advance(LifecycleState::Draining);
            tracing::info!(address = %self.local_addr, ?deadline, "Draining gRPC server");
        }

        match tokio::time::timeout(deadline, self.stopped.wait()).await {
            Ok(outcome) => {
                if let ServeOutcome::Failed(reason) = outcome {
                    tracing::warn!(%reason, "gRPC server had already failed before stop");
                }
                Ok(())
            }
            Err(_) => {
                tracing::warn!(
                    address = %self.local_addr,
                    ?deadline,
                    "gRPC server did not drain in time"
                );
                Err(ServerError::ShutdownTimeout { deadline })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistrationError;
    use crate::registrar::registrar_fn;
    use std::sync::atomic::AtomicUsize;

    fn noop(name: &str) -> impl ServiceRegistrar {
        registrar_fn(name, |_| Ok(()))
    }

    #[test]
    fn test_state_only_moves_forward() {
        let state = StateCell::new();
        assert_eq!(state.get(), LifecycleState::Unbound);

        state.advance(LifecycleState::Serving);
        state.advance(LifecycleState::Bound);
        assert_eq!(state.get(), LifecycleState::Serving);

        state.advance(LifecycleState::Stopped);
        state.advance(LifecycleState::Draining);
        assert_eq!(state.get(), LifecycleState::Stopped);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(LifecycleState::Draining.to_string(), "draining");
    }

    #[test]
    fn test_address_formatting() {
        assert_eq!(ServerLifecycle::new("127.0.0.1", 80).address(), "127.0.0.1:80");
        assert_eq!(ServerLifecycle::new("::1", 80).address(), "[::1]:80");
        assert_eq!(ServerLifecycle::new("localhost", 0).address(), "localhost:0");
    }

    #[tokio::test]
    async fn test_start_without_registrars() {
        let result = ServerLifecycle::new("127.0.0.1", 0).start().await;
        assert!(matches!(result, Err(ServerError::NoRegistrars)));
    }

    #[tokio::test]
    async fn test_first_failure_stops_registration() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let after = Arc::clone(&attempts);

        let result = ServerLifecycle::new("127.0.0.1", 0)
            .registrar(noop("first"))
            .registrar(registrar_fn("second", |_| {
                Err(RegistrationError::failed("boom"))
            }))
            .registrar(registrar_fn("third", move |_| {
                after.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .start()
            .await;

        match result {
            Err(ServerError::Registration { registrar, source }) => {
                assert_eq!(registrar, "second");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("expected registration error, got {other:?}"),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let server = ServerLifecycle::new("127.0.0.1", 0)
            .registrar(noop("noop"))
            .start()
            .await
            .unwrap();

        assert_eq!(server.state(), LifecycleState::Serving);
        assert_ne!(server.local_addr().port(), 0);
        assert_eq!(server.registrars(), ["noop".to_string()]);

        let stopped = server.stopped();
        assert!(!stopped.has_fired());

        server.stop(Duration::from_secs(5)).await.unwrap();

        assert_eq!(server.state(), LifecycleState::Stopped);
        assert_eq!(stopped.outcome(), Some(ServeOutcome::Graceful));

        // Second stop is a no-op.
        server.stop(Duration::from_millis(10)).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_local_address() {
        let result = ServerLifecycle::new("192.0.2.1", 0)
            .registrar(noop("noop"))
            .start()
            .await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }
}
