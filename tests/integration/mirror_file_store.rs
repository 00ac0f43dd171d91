use std::sync::Arc;

use remotify::fixtures::content::{data_page, error_envelope, file_node};
use remotify::mirror::FileStoreMirror;
use remotify::pool::RunSettings;
use remotify::report::{FailureKind, OutcomeStatus, RunReport};
use remotify::scope::TenantScope;
use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

use crate::mocks::platform::{download_mock, json_response, list_files_mock, platform, ACCOUNT};

fn mirror(mock_server: &MockServer, destination: &std::path::Path) -> FileStoreMirror {
    FileStoreMirror::new(
        Arc::new(platform(mock_server)),
        destination,
        None,
        RunSettings::default(),
    )
}

#[tokio::test]
async fn downloads_files_and_skips_folders() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    list_files_mock(data_page(vec![
        file_node("scripts", "/scripts", "FOLDER"),
        file_node("run_sh", "/scripts/run.sh", "FILE"),
    ]))
    .expect(1)
    .mount(&mock_server)
    .await;
    download_mock(
        "run_sh",
        ResponseTemplate::new(200).set_body_raw("echo hi", "application/octet-stream"),
    )
    .expect(1)
    .mount(&mock_server)
    .await;
    download_mock("scripts", json_response(200, json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = RunReport::new();
    mirror(&mock_server, dir.path())
        .mirror_scope(&TenantScope::account(ACCOUNT), &report)
        .await;

    let written = dir.path().join("account/scripts/run.sh");
    assert_eq!(std::fs::read_to_string(written).unwrap(), "echo hi");
    let summary = report.summary();
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.folder_skipped, 1);
    assert_eq!(report.exit_code(), 0);

    mock_server.verify().await;
}

#[tokio::test]
async fn folder_answer_from_platform_is_skipped() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    list_files_mock(data_page(vec![json!({
        "identifier": "charts",
        "path": "/charts.d",
    })]))
    .mount(&mock_server)
    .await;
    download_mock(
        "charts",
        json_response(
            400,
            error_envelope("f-1", &["Downloading folder not supported"]),
        ),
    )
    .expect(1)
    .mount(&mock_server)
    .await;

    let report = RunReport::new();
    mirror(&mock_server, dir.path())
        .mirror_scope(&TenantScope::account(ACCOUNT), &report)
        .await;

    assert_eq!(report.summary().folder_skipped, 1);
    assert!(!dir.path().join("account/charts.d").exists());
    assert_eq!(report.exit_code(), 0);

    mock_server.verify().await;
}

#[tokio::test]
async fn path_escaping_the_root_is_never_written() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("mirror");

    list_files_mock(data_page(vec![file_node(
        "evil",
        "../../etc/passwd",
        "FILE",
    )]))
    .mount(&mock_server)
    .await;
    download_mock("evil", json_response(200, json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = RunReport::new();
    mirror(&mock_server, &destination)
        .mirror_scope(&TenantScope::account(ACCOUNT), &report)
        .await;

    let outcomes = report.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].status,
        OutcomeStatus::Failed(FailureKind::Filesystem)
    );
    assert!(!dir.path().join("etc/passwd").exists());

    mock_server.verify().await;
}

#[tokio::test]
async fn org_scope_sends_org_but_not_project() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    list_files_mock(data_page(vec![file_node("values", "/values.yaml", "FILE")]))
        .mount(&mock_server)
        .await;
    download_mock("values", ResponseTemplate::new(200).set_body_string("replicas: 2"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = RunReport::new();
    mirror(&mock_server, dir.path())
        .mirror_scope(&TenantScope::org(ACCOUNT, "default"), &report)
        .await;

    assert!(dir.path().join("org/default/values.yaml").exists());

    let requests = mock_server.received_requests().await.unwrap();
    let download = requests
        .iter()
        .find(|r| r.url.path().ends_with("/download"))
        .unwrap();
    let keys: Vec<String> = download.url.query_pairs().map(|(k, _)| k.into_owned()).collect();
    assert!(keys.contains(&"accountIdentifier".to_string()));
    assert!(keys.contains(&"orgIdentifier".to_string()));
    assert!(!keys.contains(&"projectIdentifier".to_string()));

    mock_server.verify().await;
}

#[tokio::test]
async fn failed_download_is_reported_with_its_detail() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    list_files_mock(data_page(vec![
        file_node("gone", "/gone.txt", "FILE"),
        file_node("kept", "/kept.txt", "FILE"),
    ]))
    .mount(&mock_server)
    .await;
    download_mock(
        "gone",
        json_response(404, error_envelope("d-7", &["File not found"])),
    )
    .mount(&mock_server)
    .await;
    download_mock("kept", ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let report = RunReport::new();
    mirror(&mock_server, dir.path())
        .mirror_scope(&TenantScope::account(ACCOUNT), &report)
        .await;

    let failed = report
        .outcomes()
        .into_iter()
        .find(|o| o.status.is_failure())
        .unwrap();
    assert_eq!(failed.entity.identifier, "gone.txt");
    assert!(failed.detail.unwrap().contains("d-7"));
    assert!(dir.path().join("account/kept.txt").exists());
    assert_eq!(report.exit_code(), 1);
}
