pub mod http;
#[cfg(test)]
pub(crate) mod stub;
pub mod types;

pub use http::HttpPlatform;
pub use types::{
    Connector, Environment, FileStoreEntry, Organization, OverrideUpdate, PipelineSummary,
    Project, ServiceOverride, ServiceSummary, ServiceUpdate, TemplateSummary,
};

use async_trait::async_trait;

use crate::classify::RawResponse;
use crate::entity::MoveRequest;
use crate::error::PlatformError;
use crate::scope::TenantScope;

/// Page-size ceilings. Listings fetch a single page of this size.
pub mod limits {
    pub const ORGANIZATIONS: usize = 1000;
    pub const PROJECTS: usize = 500;
    pub const PIPELINES: usize = 1000;
    pub const TEMPLATES: usize = 1000;
    pub const SERVICES: usize = 1000;
    pub const FILES: usize = 2000;
}

/// The platform endpoints the migration depends on.
///
/// Listings decode the response; move, update and download calls hand back
/// the raw response so the caller can classify it.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn list_organizations(&self, account: &str) -> Result<Vec<Organization>, PlatformError>;

    async fn list_projects(&self, account: &str) -> Result<Vec<Project>, PlatformError>;

    async fn list_pipelines(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<PipelineSummary>, PlatformError>;

    async fn list_templates(
        &self,
        scope: &TenantScope,
    ) -> Result<Vec<TemplateSummary>, PlatformError>;

    async fn list_services(&self, scope: &TenantScope)
        -> Result<Vec<ServiceSummary>, PlatformError>;

    async fn list_environments(&self, scope: &TenantScope)
        -> Result<Vec<Environment>, PlatformError>;

    async fn list_service_overrides(
        &self,
        scope: &TenantScope,
        environment: &str,
    ) -> Result<Vec<ServiceOverride>, PlatformError>;

    async fn get_connector(
        &self,
        scope: &TenantScope,
        reference: &str,
    ) -> Result<Connector, PlatformError>;

    async fn list_files(&self, scope: &TenantScope) -> Result<Vec<FileStoreEntry>, PlatformError>;

    async fn move_config(&self, request: &MoveRequest) -> Result<RawResponse, PlatformError>;

    async fn update_service(&self, update: &ServiceUpdate) -> Result<RawResponse, PlatformError>;

    async fn update_service_override(
        &self,
        update: &OverrideUpdate,
    ) -> Result<RawResponse, PlatformError>;

    async fn download_file(
        &self,
        scope: &TenantScope,
        identifier: &str,
    ) -> Result<RawResponse, PlatformError>;
}
