//! Lifecycle behaviour of the server service against a scripted backend.

mod support;

use std::time::Duration;

use server_manager::domain::{ServerId, ServerStatus, ServerType};
use server_manager::error::ErrorKind;
use server_manager::port::{CreateServerRequest, ServerFilter, UpdateServerRequest};
use server_manager::testkit::domain::create_request;
use server_manager::testkit::orchestrator::{Call, Op};
use support::fixtures;

#[tokio::test]
async fn create_provisions_and_records_resource_ref() {
    let (service, orchestrator, _) = fixtures::scripted();

    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();

    assert_eq!(server.status(), ServerStatus::Running);
    assert_eq!(server.resource_ref.as_deref(), Some("ref-vpn-1"));
    assert_eq!(orchestrator.calls(), vec![Call::Create("vpn-1".into())]);

    let stored = service.get_server(server.id()).await.unwrap();
    assert_eq!(stored, server);
}

#[tokio::test]
async fn failed_create_keeps_an_error_row() {
    let (service, orchestrator, _) = fixtures::scripted();
    orchestrator.fail(Op::Create, "image pull backoff");

    let err = service
        .create_server(create_request("dpi-1", ServerType::Dpi))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infra);
    assert!(err.to_string().contains("image pull backoff"));

    let listed = service.list_servers(&ServerFilter::default()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "dpi-1");
    assert_eq!(listed[0].status(), ServerStatus::Error);
    assert!(listed[0].resource_ref.is_none());
}

#[tokio::test]
async fn invalid_name_is_rejected_without_backend_call() {
    let (service, orchestrator, servers) = fixtures::scripted();

    let err = service
        .create_server(CreateServerRequest::new("Bad_Name", ServerType::Gateway, "eu"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(orchestrator.calls().is_empty());
    assert!(servers.all_including_deleted().is_empty());
}

#[tokio::test]
async fn stop_then_start_round_trips_through_backend() {
    let (service, orchestrator, _) = fixtures::scripted();
    let server = service
        .create_server(create_request("gw-1", ServerType::Gateway))
        .await
        .unwrap();

    let stopped = service.stop_server(server.id()).await.unwrap();
    assert_eq!(stopped.status(), ServerStatus::Stopped);

    let err = service.stop_server(server.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let started = service.start_server(server.id()).await.unwrap();
    assert_eq!(started.status(), ServerStatus::Running);

    assert_eq!(
        orchestrator.calls(),
        vec![
            Call::Create("gw-1".into()),
            Call::Stop("gw-1".into()),
            Call::Start("gw-1".into()),
        ]
    );
}

#[tokio::test]
async fn backend_failure_leaves_status_unchanged() {
    let (service, orchestrator, _) = fixtures::scripted();
    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();
    orchestrator.fail(Op::Stop, "daemon unreachable");

    let err = service.stop_server(server.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infra);

    let stored = service.get_server(server.id()).await.unwrap();
    assert_eq!(stored.status(), ServerStatus::Running);
}

#[tokio::test]
async fn restart_stops_then_starts() {
    let (service, orchestrator, _) = fixtures::scripted();
    let server = service
        .create_server(create_request("an-1", ServerType::Analytics))
        .await
        .unwrap();

    let restarted = service.restart_server(server.id()).await.unwrap();
    assert_eq!(restarted.status(), ServerStatus::Running);
    assert_eq!(
        &orchestrator.calls()[1..],
        &[Call::Stop("an-1".into()), Call::Start("an-1".into())]
    );
}

#[tokio::test]
async fn restart_of_stopped_server_skips_start() {
    let (service, orchestrator, _) = fixtures::scripted();
    let server = service
        .create_server(create_request("an-1", ServerType::Analytics))
        .await
        .unwrap();
    service.stop_server(server.id()).await.unwrap();

    let err = service.restart_server(server.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(!orchestrator.calls().contains(&Call::Start("an-1".into())));
}

#[tokio::test]
async fn delete_tombstones_the_row() {
    let (service, orchestrator, servers) = fixtures::scripted();
    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();

    service.delete_server(server.id()).await.unwrap();

    assert!(service.get_server(server.id()).await.unwrap_err().is_not_found());
    assert!(orchestrator.calls().contains(&Call::Delete("vpn-1".into())));
    let rows = servers.all_including_deleted();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_deleted());
    assert_eq!(rows[0].status(), ServerStatus::Deleting);

    let err = service.delete_server(server.id()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_succeeds_when_backend_resource_is_gone() {
    let (service, orchestrator, _) = fixtures::scripted();
    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();
    orchestrator.fail_not_found(Op::Delete);

    service.delete_server(server.id()).await.unwrap();
    assert!(service.get_server(server.id()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn failed_teardown_marks_error_and_can_be_retried() {
    let (service, orchestrator, _) = fixtures::scripted();
    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();
    orchestrator.fail(Op::Delete, "volume busy");

    let err = service.delete_server(server.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infra);
    let stored = service.get_server(server.id()).await.unwrap();
    assert_eq!(stored.status(), ServerStatus::Error);

    orchestrator.clear_failures();
    service.delete_server(server.id()).await.unwrap();
    assert!(service.get_server(server.id()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn error_server_cannot_be_started() {
    let (service, orchestrator, _) = fixtures::scripted();
    orchestrator.fail(Op::Create, "quota exceeded");
    let _ = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await;
    let server = service
        .list_servers(&ServerFilter::default())
        .await
        .unwrap()
        .remove(0);

    let err = service.start_server(server.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let (service, orchestrator, _) = fixtures::scripted();
    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();
    orchestrator.set_latency(Duration::from_secs(3));

    let err = service.stop_server(server.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infra);
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn rename_changes_only_the_record() {
    let (service, orchestrator, _) = fixtures::scripted();
    let server = service
        .create_server(create_request("vpn-1", ServerType::Vpn))
        .await
        .unwrap();

    let renamed = service
        .update_server(
            server.id(),
            UpdateServerRequest {
                name: Some("vpn-primary".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(renamed.name, "vpn-primary");
    assert_eq!(renamed.resource_ref.as_deref(), Some("ref-vpn-1"));
    assert_eq!(orchestrator.calls().len(), 1);

    let err = service
        .update_server(
            server.id(),
            UpdateServerRequest {
                name: Some("Not Valid".into()),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn active_names_are_unique() {
    let (service, orchestrator, servers) = fixtures::scripted();
    let first = service
        .create_server(create_request("gw-1", ServerType::Gateway))
        .await
        .unwrap();
    let second = service
        .create_server(create_request("gw-2", ServerType::Gateway))
        .await
        .unwrap();

    let err = service
        .create_server(create_request("gw-1", ServerType::Gateway))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(orchestrator.calls().len(), 2);
    assert_eq!(servers.all_including_deleted().len(), 2);

    let err = service
        .update_server(
            second.id(),
            UpdateServerRequest {
                name: Some("gw-1".into()),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    service.delete_server(first.id()).await.unwrap();
    let reused = service
        .create_server(create_request("gw-1", ServerType::Gateway))
        .await
        .unwrap();
    assert_eq!(reused.status(), ServerStatus::Running);
}

#[tokio::test]
async fn scale_records_replicas() {
    let (service, orchestrator, _) = fixtures::scripted();
    let server = service
        .create_server(create_request("gw-1", ServerType::Gateway))
        .await
        .unwrap();

    let scaled = service.scale_server(server.id(), 3).await.unwrap();
    assert_eq!(scaled.replicas, Some(3));
    assert!(orchestrator
        .calls()
        .contains(&Call::Scale("gw-1".into(), 3)));

    let err = service.scale_server(server.id(), -1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn scale_needs_a_running_server_and_a_positive_count() {
    let (service, orchestrator, _) = fixtures::scripted();
    let server = service
        .create_server(create_request("gw-1", ServerType::Gateway))
        .await
        .unwrap();

    let err = service.scale_server(server.id(), 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("stop the server"));

    service.stop_server(server.id()).await.unwrap();
    let err = service.scale_server(server.id(), 2).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert!(!orchestrator
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Scale(..))));
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let (service, _, _) = fixtures::scripted();
    let missing = ServerId::new("does-not-exist");

    assert!(service.get_server(&missing).await.unwrap_err().is_not_found());
    assert!(service.start_server(&missing).await.unwrap_err().is_not_found());
    assert!(service.stop_server(&missing).await.unwrap_err().is_not_found());
    assert!(service.delete_server(&missing).await.unwrap_err().is_not_found());
    assert!(service
        .scale_server(&missing, 1)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn list_filters_by_type_and_region() {
    let (service, _, _) = fixtures::scripted();
    for (name, server_type, region) in [
        ("vpn-us", ServerType::Vpn, "us"),
        ("vpn-eu", ServerType::Vpn, "eu"),
        ("dpi-us", ServerType::Dpi, "us"),
    ] {
        service
            .create_server(CreateServerRequest::new(name, server_type, region))
            .await
            .unwrap();
    }

    let vpns = service
        .list_servers(&ServerFilter::by_type(ServerType::Vpn))
        .await
        .unwrap();
    assert_eq!(vpns.len(), 2);

    let filter = ServerFilter {
        region: Some("us".into()),
        ..ServerFilter::default()
    };
    let names: Vec<_> = service
        .list_servers(&filter)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["dpi-us", "vpn-us"]);
}
