//! The `grpcbeacon.v1.Beacon` demo service.
//!
//! `Signal` answers with `"Beacon signal at <RFC 1123 time>"` and a fixed
//! details map describing the host: `Hostname`, `BeaconName` and, when set,
//! `DeploymentGroup`.

use std::collections::HashMap;
use std::sync::Arc;

use beacon_config::Environment;
use beacon_server::metadata::peer_identity_from_metadata;
use beacon_server::{registrar_fn, ServiceRegistrar};
use chrono::{DateTime, Utc};
use tonic::{Request, Response, Status};

use crate::proto::grpcbeacon::v1::beacon_server::{Beacon, BeaconServer, SERVICE_NAME};
use crate::proto::grpcbeacon::v1::{SignalRequest, SignalResponse};

/// Details key for the host name.
pub const DETAIL_HOSTNAME: &str = "Hostname";
/// Details key for the configured beacon name.
pub const DETAIL_BEACON_NAME: &str = "BeaconName";
/// Details key for the deployment group.
pub const DETAIL_DEPLOYMENT_GROUP: &str = "DeploymentGroup";

/// Names the beacon answers to on the health service.
pub const HEALTH_NAMES: [&str; 2] = ["Beacon", SERVICE_NAME];

const RFC_1123: &str = "%a, %d %b %Y %H:%M:%S %Z";

/// Handler for `grpcbeacon.v1.Beacon`.
#[derive(Debug, Clone)]
pub struct BeaconService {
    details: Arc<HashMap<String, String>>,
}

impl BeaconService {
    /// Builds the handler; the details map is fixed from here on.
    pub fn new(env: &Environment, beacon_name: &str) -> Self {
        let mut details = HashMap::from([
            (DETAIL_HOSTNAME.to_string(), env.host_name.clone()),
            (DETAIL_BEACON_NAME.to_string(), beacon_name.to_string()),
        ]);
        if let Some(group) = &env.deployment_group {
            details.insert(DETAIL_DEPLOYMENT_GROUP.to_string(), group.clone());
        }

        Self {
            details: Arc::new(details),
        }
    }

    /// Details returned with every reply.
    #[must_use]
    pub fn details(&self) -> &HashMap<String, String> {
        &self.details
    }

    /// Reply text for a signal received at `at`.
    #[must_use]
    pub fn reply_at(at: DateTime<Utc>) -> String {
        format!("Beacon signal at {}", at.format(RFC_1123))
    }

    /// Registrar attaching this handler to a server.
    pub fn registrar(self) -> impl ServiceRegistrar {
        registrar_fn("beacon", move |routes| {
            routes.add_service(BeaconServer::new(self.clone()));
            Ok(())
        })
    }
}

#[tonic::async_trait]
impl Beacon for BeaconService {
    async fn signal(
        &self,
        request: Request<SignalRequest>,
    ) -> Result<Response<SignalResponse>, Status> {
        let peer = peer_identity_from_metadata(request.metadata());
        tracing::info!(
            peer = peer.as_deref().unwrap_or("<unknown>"),
            remote_addr = ?request.remote_addr(),
            metadata = ?request.metadata(),
            message = %request.get_ref().message,
            "Signal received"
        );

        Ok(Response::new(SignalResponse {
            reply: Self::reply_at(Utc::now()),
            details: (*self.details).clone(),
        }))
    }
}
