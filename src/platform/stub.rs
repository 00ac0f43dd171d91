use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{
    Connector, Environment, FileStoreEntry, Organization, OverrideUpdate, PipelineSummary,
    Platform, Project, ServiceOverride, ServiceSummary, ServiceUpdate, TemplateSummary,
};
use crate::classify::RawResponse;
use crate::entity::MoveRequest;
use crate::error::PlatformError;
use crate::scope::TenantScope;

#[derive(Clone, Debug)]
pub enum StubReply {
    Respond(RawResponse),
    Fail(String),
    Hang(Duration),
}

impl StubReply {
    pub fn ok(body: &str) -> Self {
        StubReply::Respond(RawResponse::new(200, body.as_bytes().to_vec()))
    }

    pub fn status(status: u16, body: serde_json::Value) -> Self {
        StubReply::Respond(RawResponse::new(
            status,
            serde_json::to_vec(&body).unwrap(),
        ))
    }
}

/// Canned platform keyed by scope display string or entity identifier.
#[derive(Default)]
pub struct StubPlatform {
    pub orgs: Vec<Organization>,
    pub projects: Vec<Project>,
    pub pipelines: HashMap<String, Vec<PipelineSummary>>,
    pub templates: HashMap<String, Vec<TemplateSummary>>,
    pub services: HashMap<String, Vec<ServiceSummary>>,
    pub environments: HashMap<String, Vec<Environment>>,
    pub overrides: HashMap<String, Vec<ServiceOverride>>,
    pub connectors: HashMap<String, Connector>,
    pub files: HashMap<String, Vec<FileStoreEntry>>,
    pub failing_scopes: HashSet<String>,
    pub moves: HashMap<String, StubReply>,
    pub updates: HashMap<String, StubReply>,
    pub downloads: HashMap<String, StubReply>,
    pub calls: Mutex<Vec<String>>,
    pub updated_yaml: Mutex<Vec<String>>,
}

impl StubPlatform {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_scope(&self, scope: &TenantScope) -> Result<(), PlatformError> {
        if self.failing_scopes.contains(&scope.to_string()) {
            return Err(PlatformError::Domain {
                status: 403,
                detail: format!("CorrelationId: stub, ResponseMessages: [denied {}]", scope),
            });
        }
        Ok(())
    }

    fn listed<T: Clone>(
        &self,
        map: &HashMap<String, Vec<T>>,
        scope: &TenantScope,
    ) -> Result<Vec<T>, PlatformError> {
        self.check_scope(scope)?;
        Ok(map.get(&scope.to_string()).cloned().unwrap_or_default())
    }

    async fn reply(
        &self,
        replies: &HashMap<String, StubReply>,
        identifier: &str,
    ) -> Result<RawResponse, PlatformError> {
        match replies.get(identifier) {
            Some(StubReply::Respond(response)) => Ok(response.clone()),
            Some(StubReply::Fail(message)) => Err(PlatformError::transport(
                identifier,
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, message.clone()),
            )),
            Some(StubReply::Hang(duration)) => {
                tokio::time::sleep(*duration).await;
                Ok(RawResponse::new(200, Vec::new()))
            }
            None => Ok(RawResponse::new(200, b"{}".to_vec())),
        }
    }
}

#[async_trait]
impl Platform for StubPlatform {
    async fn list_organizations(&self, _account: &str) -> Result<Vec<Organization>, PlatformError> {
        Ok(self.orgs.clone())
    }

    async fn list_projects(&self, _account: &str) -> Result<Vec<Project>, PlatformError> {
        Ok(self.projects.clone())
    }

    async fn list_pipelines(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<PipelineSummary>, PlatformError> {
        self.listed(&self.pipelines, scope)
    }

    async fn list_templates(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<TemplateSummary>, PlatformError> {
        self.listed(&self.templates, scope)
    }

    async fn list_services(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<ServiceSummary>, PlatformError> {
        self.listed(&self.services, scope)
    }

    async fn list_environments(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<Environment>, PlatformError> {
        self.listed(&self.environments, scope)
    }

    async fn list_service_overrides(
        &self,
        scope: &TenantScope,
        environment: &str,
    ) -> Result<Vec<ServiceOverride>, PlatformError> {
        self.check_scope(scope)?;
        Ok(self
            .overrides
            .get(&format!("{}#{}", scope, environment))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_connector(
        &self,
        scope: &TenantScope,
        reference: &str,
    ) -> Result<Connector, PlatformError> {
        self.record(format!("connector {} {}", scope, reference));
        self.connectors
            .get(reference)
            .cloned()
            .ok_or_else(|| PlatformError::Domain {
                status: 404,
                detail: format!("CorrelationId: stub, ResponseMessages: [{} not found]", reference),
            })
    }

    async fn list_files(&self, scope: &TenantScope) -> Result<Vec<FileStoreEntry>, PlatformError> {
        self.listed(&self.files, scope)
    }

    async fn move_config(&self, request: &MoveRequest) -> Result<RawResponse, PlatformError> {
        let identifier = request.entity.identifier();
        self.record(format!("move {}", identifier));
        self.reply(&self.moves, identifier).await
    }

    async fn update_service(&self, update: &ServiceUpdate) -> Result<RawResponse, PlatformError> {
        self.record(format!("update service {}", update.identifier));
        self.updated_yaml.lock().unwrap().push(update.yaml.clone());
        self.reply(&self.updates, &update.identifier).await
    }

    async fn update_service_override(
        &self,
        update: &OverrideUpdate,
    ) -> Result<RawResponse, PlatformError> {
        let key = format!("{}:{}", update.environment_identifier, update.service_identifier);
        self.record(format!("update override {}", key));
        self.updated_yaml.lock().unwrap().push(update.yaml.clone());
        self.reply(&self.updates, &key).await
    }

    async fn download_file(
        &self,
        _scope: &TenantScope,
        identifier: &str,
    ) -> Result<RawResponse, PlatformError> {
        self.record(format!("download {}", identifier));
        self.reply(&self.downloads, identifier).await
    }
}
