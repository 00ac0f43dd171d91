use std::sync::Arc;
use std::time::Duration;

use remotify::cli::{AlreadyRemotePolicy, GitTarget, ParsedConfig, ScopeFilter};
use remotify::entity::{EntityKind, MigratableEntity};
use remotify::fixtures::content::{
    connector_json, data_page, error_envelope, org_item, pipeline_json, project_item,
    service_item, template_json,
};
use remotify::hierarchy::Hierarchy;
use remotify::orchestrator::Orchestrator;
use remotify::pool::AbortSignal;
use remotify::report::{OutcomeStatus, RunReport};
use remotify::scope::TenantScope;
use serde_json::json;
use wiremock::MockServer;

use crate::mocks::platform::{
    connector_mock, json_response, list_orgs_mock, list_pipelines_mock, list_projects_mock,
    list_services_mock, list_templates_mock, move_pipeline_mock, move_service_mock, platform,
    ACCOUNT, API_KEY,
};

fn config(kinds: Vec<EntityKind>) -> ParsedConfig {
    ParsedConfig {
        version: "0.1.0".to_string(),
        api_key: API_KEY.to_string(),
        base_url: None,
        account: ACCOUNT.to_string(),
        git_target: Some(GitTarget {
            connector_ref: "account.github".to_string(),
            repo_name: "harness-config".to_string(),
            branch_name: "main".to_string(),
            file_path: ".harness/{org}/{project}/{identifier}.yaml".to_string(),
            commit_message: "Move to git".to_string(),
        }),
        kinds,
        scope: ScopeFilter::default(),
        already_remote: AlreadyRemotePolicy::Services,
        concurrency: 2,
        request_timeout: Duration::from_secs(5),
        mirror: None,
    }
}

#[tokio::test]
async fn lists_entities_of_every_project() {
    let mock_server = MockServer::start().await;

    list_projects_mock(data_page(vec![
        project_item("default", "demo"),
        project_item("payments", "checkout"),
    ]))
    .expect(1)
    .mount(&mock_server)
    .await;
    list_pipelines_mock(
        "default",
        "demo",
        json_response(200, data_page(vec![pipeline_json("deploy")])),
    )
    .expect(1)
    .mount(&mock_server)
    .await;
    list_templates_mock(
        "payments",
        "checkout",
        json!([template_json("stage", "payments", "checkout", "v2")]),
    )
    .expect(1)
    .mount(&mock_server)
    .await;

    let report = RunReport::new();
    let hierarchy = Hierarchy::new(
        Arc::new(platform(&mock_server)),
        ACCOUNT,
        ScopeFilter::default(),
    );

    let scopes = hierarchy.project_scopes().await.unwrap();
    assert_eq!(
        scopes,
        vec![
            TenantScope::project(ACCOUNT, "default", "demo").unwrap(),
            TenantScope::project(ACCOUNT, "payments", "checkout").unwrap(),
        ]
    );

    let pipelines = hierarchy
        .entities(&scopes[0], &[EntityKind::Pipeline], &report)
        .await;
    let templates = hierarchy
        .entities(&scopes[1], &[EntityKind::Template], &report)
        .await;

    assert_eq!(
        pipelines,
        vec![MigratableEntity::Pipeline {
            identifier: "deploy".to_string(),
            org: "default".to_string(),
            project: "demo".to_string(),
        }]
    );
    assert_eq!(
        templates,
        vec![MigratableEntity::Template {
            identifier: "stage".to_string(),
            org: "payments".to_string(),
            project: "checkout".to_string(),
            version_label: "v2".to_string(),
        }]
    );
    assert!(!report.has_failures());

    mock_server.verify().await;
}

#[tokio::test]
async fn file_store_scopes_include_account_and_orgs() {
    let mock_server = MockServer::start().await;

    list_orgs_mock(json!([org_item("default")]))
        .expect(1)
        .mount(&mock_server)
        .await;
    list_projects_mock(data_page(vec![project_item("default", "demo")]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let hierarchy = Hierarchy::new(
        Arc::new(platform(&mock_server)),
        ACCOUNT,
        ScopeFilter::default(),
    );
    let scopes = hierarchy.file_store_scopes().await.unwrap();

    assert_eq!(
        scopes,
        vec![
            TenantScope::account(ACCOUNT),
            TenantScope::org(ACCOUNT, "default"),
            TenantScope::project(ACCOUNT, "default", "demo").unwrap(),
        ]
    );

    mock_server.verify().await;
}

#[tokio::test]
async fn migrates_whole_account_end_to_end() {
    let mock_server = MockServer::start().await;

    list_projects_mock(data_page(vec![project_item("default", "demo")]))
        .mount(&mock_server)
        .await;
    connector_mock("github", connector_json("github", "Github"))
        .expect(1)
        .mount(&mock_server)
        .await;
    list_pipelines_mock(
        "default",
        "demo",
        json_response(200, data_page(vec![pipeline_json("deploy")])),
    )
    .mount(&mock_server)
    .await;
    list_services_mock(
        "default",
        "demo",
        json!([service_item("svc1", "default", "demo")]),
    )
    .mount(&mock_server)
    .await;
    move_pipeline_mock("default", "demo", "deploy", json_response(200, json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;
    move_service_mock(
        "svc1",
        json_response(
            400,
            error_envelope("s-1", &["Service [svc1] is already remote"]),
        ),
    )
    .expect(1)
    .mount(&mock_server)
    .await;

    let orchestrator = Orchestrator::new(
        Arc::new(platform(&mock_server)),
        config(vec![EntityKind::Pipeline, EntityKind::Service]),
        AbortSignal::new(),
    );
    let report = RunReport::new();

    orchestrator.migrate(&report).await.unwrap();

    let summary = report.summary();
    assert_eq!(summary.moved, 1);
    assert_eq!(summary.already_skipped, 1);
    assert_eq!(report.exit_code(), 0);

    mock_server.verify().await;
}

#[tokio::test]
async fn unlistable_project_is_a_scope_failure() {
    let mock_server = MockServer::start().await;

    list_projects_mock(data_page(vec![
        project_item("default", "locked"),
        project_item("default", "open"),
    ]))
    .mount(&mock_server)
    .await;
    list_pipelines_mock(
        "default",
        "locked",
        json_response(403, error_envelope("p-4", &["Unauthorized"])),
    )
    .mount(&mock_server)
    .await;
    list_pipelines_mock(
        "default",
        "open",
        json_response(200, data_page(vec![pipeline_json("build")])),
    )
    .mount(&mock_server)
    .await;
    move_pipeline_mock("default", "open", "build", json_response(200, json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let orchestrator = Orchestrator::new(
        Arc::new(platform(&mock_server)),
        config(vec![EntityKind::Pipeline]),
        AbortSignal::new(),
    );
    let report = RunReport::new();

    orchestrator.migrate(&report).await.unwrap();

    let failures = report.scope_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].scope, "acc/default/locked");
    assert!(failures[0].detail.contains("p-4"));
    assert_eq!(report.outcomes()[0].status, OutcomeStatus::Moved);
    assert_eq!(report.exit_code(), 1);

    mock_server.verify().await;
}

#[tokio::test]
async fn inventory_counts_entities_per_project() {
    let mock_server = MockServer::start().await;

    list_projects_mock(data_page(vec![project_item("default", "demo")]))
        .mount(&mock_server)
        .await;
    list_pipelines_mock(
        "default",
        "demo",
        json_response(
            200,
            data_page(vec![pipeline_json("deploy"), pipeline_json("build")]),
        ),
    )
    .mount(&mock_server)
    .await;
    list_templates_mock("default", "demo", json!([]))
        .mount(&mock_server)
        .await;
    list_services_mock(
        "default",
        "demo",
        json!([service_item("svc1", "default", "demo")]),
    )
    .mount(&mock_server)
    .await;

    let orchestrator = Orchestrator::new(
        Arc::new(platform(&mock_server)),
        config(vec![EntityKind::Pipeline]),
        AbortSignal::new(),
    );
    let report = RunReport::new();

    let inventories = orchestrator.inventory(&report).await;

    assert_eq!(inventories.len(), 1);
    assert_eq!(inventories[0].scope, "acc/default/demo");
    assert_eq!(inventories[0].pipelines, 2);
    assert_eq!(inventories[0].templates, 0);
    assert_eq!(inventories[0].services, 1);
    // no environment mock: the listing fails and is recorded
    assert_eq!(report.summary().scope_failures, 1);
}
