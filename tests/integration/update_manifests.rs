use std::sync::Arc;
use std::time::Duration;

use indoc::indoc;
use remotify::classify::{Classification, Classifier, Operation};
use remotify::cli::{AlreadyRemotePolicy, GitTarget, ParsedConfig, ScopeFilter};
use remotify::entity::EntityKind;
use remotify::fixtures::content::{
    connector_json, data_page, environment_item, error_envelope, project_item,
    service_item_with_yaml, service_override_json,
};
use remotify::orchestrator::Orchestrator;
use remotify::platform::{OverrideUpdate, Platform, ServiceUpdate};
use remotify::pool::AbortSignal;
use remotify::report::RunReport;
use serde_json::{json, Value};
use wiremock::MockServer;

use crate::mocks::platform::{
    connector_mock, json_response, list_environments_mock, list_overrides_mock,
    list_projects_mock, list_services_mock, platform, update_override_mock, update_service_mock,
    ACCOUNT, API_KEY,
};

const SERVICE_YAML: &str = indoc! {r#"
    service:
      name: checkout
      identifier: checkout
      serviceDefinition:
        type: Kubernetes
        spec:
          manifests:
            - manifest:
                identifier: k8s
                type: K8sManifest
                spec:
                  store:
                    type: Harness
                    spec:
                      files:
                        - /manifests/deployment.yaml
"#};

const OVERRIDE_YAML: &str = indoc! {r#"
    serviceOverrides:
      environmentRef: prod
      serviceRef: checkout
      manifests:
        - manifest:
            identifier: prod_values
            type: Values
            spec:
              store:
                type: Harness
                spec:
                  files:
                    - org:/values/prod.yaml
"#};

fn config() -> ParsedConfig {
    ParsedConfig {
        version: "0.1.0".to_string(),
        api_key: API_KEY.to_string(),
        base_url: None,
        account: ACCOUNT.to_string(),
        git_target: Some(GitTarget {
            connector_ref: "account.gitlab".to_string(),
            repo_name: "harness-config".to_string(),
            branch_name: "main".to_string(),
            file_path: ".harness/{identifier}.yaml".to_string(),
            commit_message: "Move to git".to_string(),
        }),
        kinds: vec![EntityKind::Service],
        scope: ScopeFilter::default(),
        already_remote: AlreadyRemotePolicy::Services,
        concurrency: 2,
        request_timeout: Duration::from_secs(5),
        mirror: None,
    }
}

fn service_update(yaml: &str) -> ServiceUpdate {
    ServiceUpdate {
        identifier: "checkout".to_string(),
        name: "Checkout".to_string(),
        org_identifier: "default".to_string(),
        project_identifier: "demo".to_string(),
        yaml: yaml.to_string(),
    }
}

#[tokio::test]
async fn update_service_puts_definition_for_account() {
    let mock_server = MockServer::start().await;

    update_service_mock(json_response(200, json!({"status": "SUCCESS"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = platform(&mock_server)
        .update_service(&service_update("service: {}"))
        .await
        .unwrap();

    assert_eq!(
        Classifier::default().classify_raw(&response, Operation::Update(EntityKind::Service)),
        Classification::Success
    );

    let requests = mock_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["identifier"], "checkout");
    assert_eq!(body["orgIdentifier"], "default");
    assert_eq!(body["projectIdentifier"], "demo");
    assert_eq!(body["yaml"], "service: {}");

    mock_server.verify().await;
}

#[tokio::test]
async fn rejected_override_update_is_a_domain_error() {
    let mock_server = MockServer::start().await;

    update_override_mock(json_response(
        400,
        error_envelope("ov-7", &["Environment prod not found"]),
    ))
    .expect(1)
    .mount(&mock_server)
    .await;

    let response = platform(&mock_server)
        .update_service_override(&OverrideUpdate {
            environment_identifier: "prod".to_string(),
            service_identifier: "checkout".to_string(),
            org_identifier: "default".to_string(),
            project_identifier: "demo".to_string(),
            yaml: OVERRIDE_YAML.to_string(),
        })
        .await
        .unwrap();

    match Classifier::default()
        .classify_raw(&response, Operation::Update(EntityKind::ServiceOverride))
    {
        Classification::DomainError { status, detail } => {
            assert_eq!(status, 400);
            assert!(detail.contains("ov-7"));
            assert!(detail.contains("Environment prod not found"));
        }
        other => panic!("unexpected classification {:?}", other),
    }

    mock_server.verify().await;
}

#[tokio::test]
async fn gitlab_connector_repoints_service_and_override() {
    let mock_server = MockServer::start().await;

    list_projects_mock(data_page(vec![project_item("default", "demo")]))
        .mount(&mock_server)
        .await;
    connector_mock("gitlab", connector_json("gitlab", "Gitlab"))
        .expect(1)
        .mount(&mock_server)
        .await;
    list_services_mock(
        "default",
        "demo",
        json!([service_item_with_yaml("checkout", "default", "demo", SERVICE_YAML)]),
    )
    .mount(&mock_server)
    .await;
    list_environments_mock("default", "demo", data_page(vec![environment_item("prod")]))
        .mount(&mock_server)
        .await;
    list_overrides_mock(
        "prod",
        data_page(vec![service_override_json("prod", "checkout", OVERRIDE_YAML)]),
    )
    .mount(&mock_server)
    .await;
    update_service_mock(json_response(200, json!({"status": "SUCCESS"})))
        .expect(1)
        .mount(&mock_server)
        .await;
    update_override_mock(json_response(200, json!({"status": "SUCCESS"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let orchestrator = Orchestrator::new(
        Arc::new(platform(&mock_server)),
        config(),
        AbortSignal::new(),
    );
    let report = RunReport::new();

    orchestrator.update_manifests(&report).await.unwrap();

    assert_eq!(report.summary().updated, 2);
    assert_eq!(report.exit_code(), 0);

    let requests = mock_server.received_requests().await.unwrap();
    let sent: Vec<Value> = requests
        .iter()
        .filter(|request| !request.body.is_empty())
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect();
    assert_eq!(sent.len(), 2);

    let service = sent.iter().find(|b| b["identifier"] == "checkout").unwrap();
    let yaml = service["yaml"].as_str().unwrap();
    assert!(yaml.contains("type: GitLab"));
    assert!(yaml.contains("connectorRef: account.gitlab"));
    assert!(yaml.contains("project/default/demo/manifests/deployment.yaml"));

    let overrides = sent
        .iter()
        .find(|b| b["environmentIdentifier"] == "prod")
        .unwrap();
    assert_eq!(overrides["serviceIdentifier"], "checkout");
    assert!(overrides["yaml"]
        .as_str()
        .unwrap()
        .contains("org/default/values/prod.yaml"));

    mock_server.verify().await;
}
