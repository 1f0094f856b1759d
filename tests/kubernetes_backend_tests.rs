//! Service behaviour over the cluster backend, driven by an in-memory
//! namespace.

mod support;

use std::sync::Arc;

use server_manager::adapter::outbound::image::ImageConfig;
use server_manager::adapter::outbound::kubernetes::{ClusterApi, KubernetesOrchestrator};
use server_manager::domain::{HealthStatus, ServerStatus, ServerType};
use server_manager::error::ErrorKind;
use server_manager::port::Orchestrator;
use server_manager::testkit::cluster::FakeClusterApi;
use server_manager::testkit::domain::create_request;
use support::fixtures;

fn orchestrator_on(api: &Arc<FakeClusterApi>) -> Arc<KubernetesOrchestrator> {
    Arc::new(KubernetesOrchestrator::new(
        api.clone(),
        "edge",
        ImageConfig::default(),
    ))
}

#[tokio::test]
async fn create_applies_deployment_and_service() {
    let (service, api) = fixtures::kubernetes();

    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();
    assert_eq!(server.resource_ref.as_deref(), Some("vpn-1"));

    let deployment = api.deployment("vpn-1").expect("deployment created");
    assert_eq!(deployment.metadata.namespace.as_deref(), Some("edge"));
    let labels = deployment.metadata.labels.unwrap();
    assert_eq!(labels["managed"], "server-manager");
    assert_eq!(labels["server-id"], server.id().as_str());
    assert_eq!(api.replicas("vpn-1"), Some(1));

    let svc = api.service("vpn-1").expect("service created");
    let spec = svc.spec.unwrap();
    assert_eq!(spec.type_.as_deref(), Some("LoadBalancer"));
    assert_eq!(spec.ports.unwrap().len(), 2);
}

#[tokio::test]
async fn failed_service_create_leaves_error_row() {
    let (service, api) = fixtures::kubernetes();
    api.fail("create_service", "quota exceeded");

    let err = service
        .create_server(create_request("gw-1", ServerType::Gateway))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infra);

    let listed = service.list_servers(&Default::default()).await.unwrap();
    assert_eq!(listed[0].status(), ServerStatus::Error);
}

#[tokio::test]
async fn stop_and_start_scale_between_zero_and_one() {
    let (service, api) = fixtures::kubernetes();
    let server = service
        .create_server(create_request("dpi-1", ServerType::Dpi))
        .await
        .unwrap();

    service.stop_server(server.id()).await.unwrap();
    assert_eq!(api.replicas("dpi-1"), Some(0));
    let health = service.record_health(server.id()).await.unwrap();
    assert_eq!(health.status, HealthStatus::Stopped);

    service.start_server(server.id()).await.unwrap();
    assert_eq!(api.replicas("dpi-1"), Some(1));
}

#[tokio::test]
async fn scale_sets_desired_replicas() {
    let (service, api) = fixtures::kubernetes();
    let server = service
        .create_server(create_request("gw-1", ServerType::Gateway))
        .await
        .unwrap();

    let scaled = service.scale_server(server.id(), 3).await.unwrap();
    assert_eq!(scaled.replicas, Some(3));
    assert_eq!(api.replicas("gw-1"), Some(3));
    assert_eq!(
        service.get_server(server.id()).await.unwrap().replicas,
        Some(3)
    );

    let listed = orchestrator_on(&api).list_servers().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), server.id());
    assert_eq!(listed[0].replicas, Some(3));
    assert_eq!(listed[0].status(), ServerStatus::Running);
    assert!(service.reconcile().await.unwrap().is_clean());
}

#[tokio::test]
async fn recorded_replicas_follow_start_and_stop() {
    let (service, api) = fixtures::kubernetes();
    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();
    assert_eq!(server.replicas, Some(1));
    service.scale_server(server.id(), 3).await.unwrap();

    let stopped = service.stop_server(server.id()).await.unwrap();
    assert_eq!(stopped.replicas, Some(0));
    assert_eq!(api.replicas("vpn-1"), Some(0));

    let started = service.start_server(server.id()).await.unwrap();
    assert_eq!(started.replicas, Some(1));
    assert_eq!(api.replicas("vpn-1"), Some(1));
    assert_eq!(
        service.get_server(server.id()).await.unwrap().replicas,
        api.replicas("vpn-1")
    );
}

#[tokio::test]
async fn scaling_to_zero_is_refused() {
    let (service, api) = fixtures::kubernetes();
    let server = service
        .create_server(create_request("gw-1", ServerType::Gateway))
        .await
        .unwrap();

    let err = service.scale_server(server.id(), 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(api.replicas("gw-1"), Some(1));

    let kept = service.get_server(server.id()).await.unwrap();
    assert_eq!(kept.status(), ServerStatus::Running);
    assert_eq!(kept.replicas, Some(1));
}

#[tokio::test]
async fn delete_removes_both_resources() {
    let (service, api) = fixtures::kubernetes();
    let server = service
        .create_server(create_request("an-1", ServerType::Analytics))
        .await
        .unwrap();

    service.delete_server(server.id()).await.unwrap();
    assert!(api.deployment("an-1").is_none());
    assert!(api.service("an-1").is_none());
}

#[tokio::test]
async fn failed_deployment_delete_still_removes_the_service() {
    let (service, api) = fixtures::kubernetes();
    let server = service
        .create_server(create_request("an-1", ServerType::Analytics))
        .await
        .unwrap();
    api.fail("delete_deployment", "finalizer stuck");

    let err = service.delete_server(server.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infra);
    assert!(err.to_string().contains("finalizer stuck"));
    assert!(api.service("an-1").is_none());
    assert!(api.deployment("an-1").is_some());
    assert_eq!(
        service.get_server(server.id()).await.unwrap().status(),
        ServerStatus::Error
    );
}

#[tokio::test]
async fn deleting_a_failed_duplicate_spares_the_live_workload() {
    let api = Arc::new(FakeClusterApi::new());
    let orchestrator = orchestrator_on(&api);
    let (owner, _) = fixtures::service_with(orchestrator.clone());
    let (other, _) = fixtures::service_with(orchestrator);

    let live = owner
        .create_server(create_request("gw-1", ServerType::Gateway))
        .await
        .unwrap();
    let err = other
        .create_server(create_request("gw-1", ServerType::Gateway))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let failed = other.list_servers(&Default::default()).await.unwrap();
    assert_eq!(failed[0].status(), ServerStatus::Error);
    assert!(failed[0].resource_ref.is_none());
    assert!(other.start_server(failed[0].id()).await.is_err());

    other.delete_server(failed[0].id()).await.unwrap();
    assert!(api.deployment("gw-1").is_some());
    assert!(api.service("gw-1").is_some());
    assert_eq!(api.replicas("gw-1"), Some(1));
    let health = owner.record_health(live.id()).await.unwrap();
    assert_eq!(health.status, HealthStatus::Running);
}

#[tokio::test]
async fn failed_pod_demotes_health() {
    let (service, api) = fixtures::kubernetes();
    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();

    let health = service.record_health(server.id()).await.unwrap();
    assert_eq!(health.status, HealthStatus::Running);

    api.fail_pod("vpn-1", "CrashLoopBackOff");
    let health = service.record_health(server.id()).await.unwrap();
    assert_eq!(health.status, HealthStatus::Error);
    assert!(health.checks.iter().any(|c| c.name == "pods" && !c.passed));
}

#[tokio::test]
async fn unready_replicas_report_starting() {
    let (service, api) = fixtures::kubernetes();
    api.hold_readiness();
    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();

    let health = service.record_health(server.id()).await.unwrap();
    assert_eq!(health.status, HealthStatus::Starting);

    let report = service.reconcile().await.unwrap();
    assert_eq!(report.backend, "kubernetes");
    assert_eq!(report.drifted.len(), 1);
    assert_eq!(report.drifted[0].recorded, ServerStatus::Running);
    assert_eq!(report.drifted[0].observed, ServerStatus::Creating);
}

#[tokio::test]
async fn missing_deployment_reads_as_unknown() {
    let (service, api) = fixtures::kubernetes();
    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();
    api.delete_deployment("vpn-1").await.unwrap();

    let health = service.record_health(server.id()).await.unwrap();
    assert_eq!(health.status, HealthStatus::Unknown);
    assert_eq!(health.message, "deployment not found");

    let stats = service.record_stats(server.id()).await.unwrap();
    assert_eq!(stats.cpu_usage, 0.0);

    let report = service.reconcile().await.unwrap();
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.missing[0].id(), server.id());
}

#[tokio::test]
async fn cluster_failure_on_stop_keeps_status() {
    let (service, api) = fixtures::kubernetes();
    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();
    api.fail("scale_deployment", "forbidden");

    let err = service.stop_server(server.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infra);
    assert!(err.to_string().contains("forbidden"));
    assert_eq!(
        service.get_server(server.id()).await.unwrap().status(),
        ServerStatus::Running
    );
}
