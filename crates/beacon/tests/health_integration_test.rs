//! Health service as composed by the beacon binary.

use std::time::Duration;

use beacon::app;
use beacon_config::{BeaconConfig, Environment};
use beacon_server::CredentialResolver;
use tokio_stream::StreamExt;
use tonic::transport::Channel;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;

fn request(service: &str) -> HealthCheckRequest {
    HealthCheckRequest {
        service: service.to_string(),
    }
}

#[tokio::test]
async fn test_health_names() {
    let config = BeaconConfig {
        port: 0,
        ..BeaconConfig::default()
    };
    let resolver = CredentialResolver::new(env!("CARGO_MANIFEST_DIR"));
    let server = app::start(&config, &Environment::default(), &resolver)
        .await
        .unwrap();
    let addr = server.local_addr();

    let channel = Channel::from_shared(format!("http://{addr}"))
        .unwrap()
        .connect()
        .await
        .unwrap();
    let mut client = HealthClient::new(channel);

    for name in ["", "liveness", "readiness", "Beacon", "grpcbeacon.v1.Beacon"] {
        let status = client.check(request(name)).await.unwrap().into_inner().status();
        assert_eq!(status, ServingStatus::Serving, "service {name:?}");
    }

    let status = client.check(request("nope")).await.unwrap_err();
    assert_eq!(status.code(), tonic::Code::NotFound);
    assert_eq!(status.message(), "service nope not found");

    let mut watch = client.watch(request("Beacon")).await.unwrap().into_inner();
    let first = watch.next().await.unwrap().unwrap();
    assert_eq!(first.status(), ServingStatus::Serving);
    drop(watch);

    drop(client);
    server.stop(Duration::from_secs(10)).await.unwrap();

    let refused = Channel::from_shared(format!("http://{addr}"))
        .unwrap()
        .connect()
        .await;
    assert!(refused.is_err());
}
