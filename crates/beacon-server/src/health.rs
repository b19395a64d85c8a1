//! `grpc.health.v1` health state.
//!
//! The table of recognized names is fixed at construction: the overall
//! service (`""`), `"liveness"`, `"readiness"` and every concrete service name
//! passed in. Every recognized name is always `SERVING`. Unknown names are a
//! `NotFound` error on `Check` and a single `SERVICE_UNKNOWN` on `Watch`.

use std::collections::BTreeSet;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tonic::service::RoutesBuilder;
use tonic::{Request, Response, Status};
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_server::{Health, HealthServer};
use tonic_health::pb::{HealthCheckRequest, HealthCheckResponse};

use crate::error::{HealthError, RegistrationError};
use crate::registrar::ServiceRegistrar;

/// Names recognized by every health table.
pub const BUILTIN_SERVICES: [&str; 3] = ["", "liveness", "readiness"];

const WATCH_CHANNEL_SIZE: usize = 4;

/// Serving status of one logical service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    /// The service is accepting calls.
    Serving,
    /// The service exists but is not accepting calls.
    NotServing,
    /// The name is not a known service.
    ServiceUnknown,
}

impl From<HealthStatus> for ServingStatus {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Serving => Self::Serving,
            HealthStatus::NotServing => Self::NotServing,
            HealthStatus::ServiceUnknown => Self::ServiceUnknown,
        }
    }
}

impl From<HealthStatus> for HealthCheckResponse {
    fn from(status: HealthStatus) -> Self {
        Self {
            status: ServingStatus::from(status).into(),
        }
    }
}

/// Per-service serving status, read-only after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthState {
    services: BTreeSet<String>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl HealthState {
    /// Builds a table recognizing the built-in names plus `services`.
    ///
    /// # Example
    ///
    /// ```
    /// use beacon_server::{HealthState, HealthStatus};
    ///
    /// let state = HealthState::new(["Beacon"]);
    /// assert_eq!(state.check("Beacon"), Ok(HealthStatus::Serving));
    /// assert_eq!(state.check(""), Ok(HealthStatus::Serving));
    /// assert!(state.check("nope").is_err());
    /// ```
    pub fn new<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let services = BUILTIN_SERVICES
            .iter()
            .map(|name| (*name).to_string())
            .chain(services.into_iter().map(Into::into))
            .collect();
        Self { services }
    }

    /// Every recognized name, in sorted order.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(String::as_str)
    }

    /// Whether `name` is in the table.
    #[must_use]
    pub fn is_recognized(&self, name: &str) -> bool {
        self.services.contains(name)
    }

    /// Point query for one service.
    ///
    /// # Errors
    ///
    /// Returns `HealthError::NotFound` carrying `name` verbatim if the name is
    /// not recognized.
    pub fn check(&self, name: &str) -> Result<HealthStatus, HealthError> {
        if self.is_recognized(name) {
            Ok(HealthStatus::Serving)
        } else {
            Err(HealthError::NotFound {
                name: name.to_string(),
            })
        }
    }

    /// Status pushed to watchers of `name`.
    #[must_use]
    pub fn watch_status(&self, name: &str) -> HealthStatus {
        self.check(name).unwrap_or(HealthStatus::ServiceUnknown)
    }

    /// Pushes the status of `name` into `sink`, then holds the subscription
    /// open until the consumer drops its end.
    ///
    /// # Errors
    ///
    /// Returns `HealthError::StreamClosed` if the consumer is already gone
    /// when the status is pushed.
    pub async fn watch<T>(&self, name: &str, sink: &mpsc::Sender<T>) -> Result<(), HealthError>
    where
        T: From<HealthStatus>,
    {
        let status = self.watch_status(name);
        sink.send(T::from(status))
            .await
            .map_err(|_| HealthError::StreamClosed)?;

        sink.closed().await;
        Ok(())
    }
}

/// Watch stream returned to the transport.
pub type HealthWatchStream =
    Pin<Box<dyn Stream<Item = Result<HealthCheckResponse, Status>> + Send + 'static>>;

/// gRPC front end over a shared [`HealthState`].
#[derive(Debug, Clone)]
pub struct HealthService {
    state: Arc<HealthState>,
}

impl HealthService {
    /// Serves `state`.
    #[must_use]
    pub fn new(state: HealthState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// The table being served.
    #[must_use]
    pub fn state(&self) -> &HealthState {
        &self.state
    }
}

#[tonic::async_trait]
impl Health for HealthService {
    async fn check(
        &self,
        request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        let name = request.into_inner().service;

        match self.state.check(&name) {
            Ok(status) => {
                tracing::debug!(service = %name, ?status, "Health check");
                Ok(Response::new(status.into()))
            }
            Err(e) => {
                tracing::debug!(service = %name, "Health check for unknown service");
                Err(e.into())
            }
        }
    }

    type WatchStream = HealthWatchStream;

    async fn watch(
        &self,
        request: Request<HealthCheckRequest>,
    ) -> Result<Response<Self::WatchStream>, Status> {
        let name = request.into_inner().service;
        let (tx, rx) = mpsc::channel::<HealthCheckResponse>(WATCH_CHANNEL_SIZE);

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            match state.watch(&name, &tx).await {
                Ok(()) => tracing::debug!(service = %name, "Health watch closed by client"),
                Err(e) => tracing::debug!(service = %name, error = %e, "Health watch dropped"),
            }
        });

        let stream = ReceiverStream::new(rx).map(Ok::<_, Status>);
        Ok(Response::new(Box::pin(stream)))
    }
}

impl ServiceRegistrar for HealthService {
    fn name(&self) -> &str {
        "health"
    }

    fn register(&self, routes: &mut RoutesBuilder) -> Result<(), RegistrationError> {
        routes.add_service(HealthServer::new(self.clone()));
        Ok(())
    }
}
