use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::types::{
    ConnectorResponse, DataPage, EnvironmentItem, FileStoreNode, OrgItem, ProjectItem,
    ServiceItem,
};
use super::{limits, Platform};
use super::{
    Connector, Environment, FileStoreEntry, Organization, OverrideUpdate, PipelineSummary,
    Project, ServiceOverride, ServiceSummary, ServiceUpdate, TemplateSummary,
};
use crate::classify::{ApiResponse, RawResponse};
use crate::cli::GitDetails;
use crate::entity::{MigratableEntity, MoveRequest};
use crate::error::PlatformError;
use crate::identity::normalize_connector_ref;
use crate::scope::TenantScope;

pub const DEFAULT_BASE_URL: &str = "https://app.harness.io";

/// Platform client over HTTPS/JSON. Holds its own credentials and connection
/// pool, so several tenants can be migrated from one process.
#[derive(Clone)]
pub struct HttpPlatform {
    base_url: String,
    api_key: String,
    account: String,
    client: Client,
}

#[derive(Serialize)]
struct PipelineMoveBody<'a> {
    git_details: &'a GitDetails,
    pipeline_identifier: &'a str,
    move_config_operation_type: &'a str,
}

impl HttpPlatform {
    pub fn new(
        base_url: Option<String>,
        api_key: impl Into<String>,
        account: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PlatformError> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlatformError::transport(base_url.clone(), e))?;

        Ok(HttpPlatform {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            account: account.into(),
            client,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    fn request(&self, method: Method, path: &str) -> (String, RequestBuilder) {
        let url = format!("{}{}", self.base_url, path);
        let builder = self
            .client
            .request(method, &url)
            .header("x-api-key", &self.api_key);
        (url, builder)
    }

    fn account_request(&self, method: Method, path: &str) -> (String, RequestBuilder) {
        let (url, builder) = self.request(method, path);
        (url, builder.header("Harness-Account", &self.account))
    }

    async fn send(&self, url: &str, builder: RequestBuilder) -> Result<RawResponse, PlatformError> {
        debug!(%url, "sending platform request");

        let response = builder
            .send()
            .await
            .map_err(|e| PlatformError::transport(url, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| PlatformError::transport(url, e))?;

        debug!(%url, status, bytes = body.len(), "platform responded");
        Ok(RawResponse::new(status, body.to_vec()))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        builder: RequestBuilder,
    ) -> Result<T, PlatformError> {
        let raw = self.send(url, builder).await?;

        match ApiResponse::from_parts(raw.status, &raw.body) {
            Ok(ApiResponse::Success(body)) => {
                serde_json::from_slice(&body).map_err(|source| PlatformError::Decode {
                    url: url.to_string(),
                    source,
                })
            }
            Ok(ApiResponse::Error(envelope)) => Err(PlatformError::Domain {
                status: raw.status,
                detail: envelope.detail(),
            }),
            Err(source) => Err(PlatformError::Decode {
                url: url.to_string(),
                source,
            }),
        }
    }
}

fn org_and_project(scope: &TenantScope) -> (&str, &str) {
    (
        scope.org_id().unwrap_or_default(),
        scope.project_id().unwrap_or_default(),
    )
}

fn entity_scope_params(account: &str, entity: &MigratableEntity) -> Vec<(&'static str, String)> {
    vec![
        ("accountIdentifier", account.to_string()),
        ("projectIdentifier", entity.project().to_string()),
        ("orgIdentifier", entity.org().to_string()),
    ]
}

#[async_trait]
impl Platform for HttpPlatform {
    async fn list_organizations(&self, account: &str) -> Result<Vec<Organization>, PlatformError> {
        let (url, builder) = self.request(Method::GET, "/v1/orgs");
        let builder = builder
            .header("Harness-Account", account)
            .query(&[("limit", limits::ORGANIZATIONS.to_string())]);

        let items: Vec<OrgItem> = self.fetch(&url, builder).await?;
        Ok(items.into_iter().map(|item| item.org).collect())
    }

    async fn list_projects(&self, account: &str) -> Result<Vec<Project>, PlatformError> {
        let (url, builder) = self.request(Method::GET, "/ng/api/projects");
        let builder = builder.query(&[
            ("accountIdentifier", account.to_string()),
            ("hasModule", "true".to_string()),
            ("pageSize", limits::PROJECTS.to_string()),
        ]);

        let page: DataPage<ProjectItem> = self.fetch(&url, builder).await?;
        Ok(page.data.content.into_iter().map(|item| item.project).collect())
    }

    async fn list_pipelines(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<PipelineSummary>, PlatformError> {
        let (url, builder) = self.request(Method::POST, "/pipeline/api/pipelines/list");
        let builder = builder
            .query(&scope.query_params())
            .query(&[("size", limits::PIPELINES.to_string())])
            .json(&json!({ "filterType": "PipelineSetup" }));

        let page: DataPage<PipelineSummary> = self.fetch(&url, builder).await?;
        Ok(page.data.content)
    }

    async fn list_templates(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<TemplateSummary>, PlatformError> {
        let (org, project) = org_and_project(scope);
        let path = format!("/v1/orgs/{}/projects/{}/templates", org, project);
        let (url, builder) = self.account_request(Method::GET, &path);
        let builder = builder.query(&[("limit", limits::TEMPLATES.to_string())]);

        self.fetch(&url, builder).await
    }

    async fn list_services(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<ServiceSummary>, PlatformError> {
        let (org, project) = org_and_project(scope);
        let path = format!("/v1/orgs/{}/projects/{}/services", org, project);
        let (url, builder) = self.account_request(Method::GET, &path);
        let builder = builder
            .query(&scope.query_params())
            .query(&[("limit", limits::SERVICES.to_string())]);

        let items: Vec<ServiceItem> = self.fetch(&url, builder).await?;
        Ok(items.into_iter().map(|item| item.service).collect())
    }

    async fn list_environments(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<Environment>, PlatformError> {
        let (url, builder) = self.request(Method::GET, "/ng/api/environmentsV2");
        let builder = builder.query(&scope.query_params());

        let page: DataPage<EnvironmentItem> = self.fetch(&url, builder).await?;
        Ok(page
            .data
            .content
            .into_iter()
            .map(|item| item.environment)
            .collect())
    }

    async fn list_service_overrides(
        &self,
        scope: &TenantScope,
        environment: &str,
    ) -> Result<Vec<ServiceOverride>, PlatformError> {
        let (url, builder) = self.request(Method::GET, "/ng/api/environmentsV2/serviceOverrides");
        let builder = builder
            .query(&[("environmentIdentifier", environment)])
            .query(&scope.query_params());

        let page: DataPage<ServiceOverride> = self.fetch(&url, builder).await?;
        Ok(page.data.content)
    }

    async fn get_connector(
        &self,
        scope: &TenantScope,
        reference: &str,
    ) -> Result<Connector, PlatformError> {
        let path = format!("/ng/api/connectors/{}", normalize_connector_ref(reference));
        let (url, builder) = self.request(Method::GET, &path);
        let builder = builder.query(&scope.query_params());

        let response: ConnectorResponse = self.fetch(&url, builder).await?;
        Ok(response.data.connector)
    }

    async fn list_files(&self, scope: &TenantScope) -> Result<Vec<FileStoreEntry>, PlatformError> {
        let (url, builder) = self.request(Method::GET, "/ng/api/file-store");
        let builder = builder
            .query(&scope.query_params())
            .query(&[("pageSize", limits::FILES.to_string())]);

        let page: DataPage<FileStoreNode> = self.fetch(&url, builder).await?;
        Ok(page.data.content.into_iter().map(Into::into).collect())
    }

    async fn move_config(&self, request: &MoveRequest) -> Result<RawResponse, PlatformError> {
        let entity = &request.entity;
        let operation = request.operation.as_str();

        let (url, builder) = match entity {
            MigratableEntity::Pipeline {
                identifier,
                org,
                project,
            } => {
                let path = format!(
                    "/v1/orgs/{}/projects/{}/pipelines/{}/move-config",
                    org, project, identifier
                );
                let (url, builder) = self.account_request(Method::POST, &path);
                let builder = builder
                    .query(&[
                        ("org", org.as_str()),
                        ("project", project.as_str()),
                        ("pipeline", identifier.as_str()),
                    ])
                    .json(&PipelineMoveBody {
                        git_details: &request.git,
                        pipeline_identifier: identifier,
                        move_config_operation_type: operation,
                    });
                (url, builder)
            }
            MigratableEntity::Template {
                identifier,
                version_label,
                ..
            } => {
                let path = format!("/template/api/templates/move-config/{}", identifier);
                let (url, builder) = self.account_request(Method::POST, &path);
                let builder = builder
                    .query(&entity_scope_params(&self.account, entity))
                    .query(&[("versionLabel", version_label.as_str())])
                    .query(&request.git.query_pairs())
                    .query(&[("moveConfigType", operation)]);
                (url, builder)
            }
            MigratableEntity::Service { identifier, .. } => {
                let path = format!("/gateway/ng/api/servicesV2/move-config/{}", identifier);
                let (url, builder) = self.request(Method::POST, &path);
                let builder = builder
                    .query(&entity_scope_params(&self.account, entity))
                    .query(&request.git.query_pairs())
                    .query(&[("moveConfigType", operation)]);
                (url, builder)
            }
        };

        self.send(&url, builder).await
    }

    async fn update_service(&self, update: &ServiceUpdate) -> Result<RawResponse, PlatformError> {
        let (url, builder) = self.request(Method::PUT, "/ng/api/servicesV2");
        let builder = builder
            .query(&[("accountIdentifier", self.account.as_str())])
            .json(update);

        self.send(&url, builder).await
    }

    async fn update_service_override(
        &self,
        update: &OverrideUpdate,
    ) -> Result<RawResponse, PlatformError> {
        let (url, builder) = self.request(Method::PUT, "/ng/api/environmentsV2/serviceOverrides");
        let builder = builder
            .query(&[("accountIdentifier", self.account.as_str())])
            .json(update);

        self.send(&url, builder).await
    }

    async fn download_file(
        &self,
        scope: &TenantScope,
        identifier: &str,
    ) -> Result<RawResponse, PlatformError> {
        let path = format!("/ng/api/file-store/files/{}/download", identifier);
        let (url, builder) = self.request(Method::GET, &path);
        let builder = builder.query(&scope.query_params());

        self.send(&url, builder).await
    }
}
