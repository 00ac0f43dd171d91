use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::cli::ScopeFilter;
use crate::entity::{EntityKind, MigratableEntity};
use crate::error::{PlatformError, ScopeError};
use crate::manifests::ManifestOwner;
use crate::platform::{limits, Platform, Project};
use crate::report::RunReport;
use crate::scope::TenantScope;

/// Listings fetch one page. A full page may mean entries were left out.
pub(crate) fn warn_if_truncated(
    resource: &str,
    scope: &TenantScope,
    count: usize,
    ceiling: usize,
) {
    if count >= ceiling {
        warn!(
            resource,
            scope = %scope,
            count,
            "listing reached its page-size ceiling; later entries may be missing"
        );
    }
}

/// Per-project entity counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub scope: String,
    pub pipelines: usize,
    pub templates: usize,
    pub services: usize,
    pub environments: usize,
    pub service_overrides: usize,
}

pub struct Hierarchy {
    platform: Arc<dyn Platform>,
    account: String,
    filter: ScopeFilter,
}

impl Hierarchy {
    pub fn new(
        platform: Arc<dyn Platform>,
        account: impl Into<String>,
        filter: ScopeFilter,
    ) -> Self {
        Hierarchy {
            platform,
            account: account.into(),
            filter,
        }
    }

    pub fn account_scope(&self) -> TenantScope {
        TenantScope::account(&self.account)
    }

    fn filter_org(&self) -> Option<&str> {
        self.filter.org.as_deref().filter(|org| !org.is_empty())
    }

    fn filter_project(&self) -> Option<&str> {
        self.filter.project.as_deref().filter(|p| !p.is_empty())
    }

    async fn projects(&self) -> Result<Vec<Project>, PlatformError> {
        let projects = self.platform.list_projects(&self.account).await?;
        warn_if_truncated("projects", &self.account_scope(), projects.len(), limits::PROJECTS);
        Ok(projects)
    }

    /// One scope per project, narrowed by the configured org/project filter.
    pub async fn project_scopes(&self) -> Result<Vec<TenantScope>, PlatformError> {
        if let (Some(org), Some(project)) = (self.filter_org(), self.filter_project()) {
            return Ok(scope_or_skip(TenantScope::project(&self.account, org, project))
                .into_iter()
                .collect());
        }

        let scopes = self
            .projects()
            .await?
            .into_iter()
            .filter(|p| self.filter_org().map_or(true, |org| p.org_identifier == org))
            .filter_map(|p| {
                scope_or_skip(TenantScope::project(
                    &self.account,
                    &p.org_identifier,
                    &p.identifier,
                ))
            })
            .collect();

        Ok(scopes)
    }

    /// Account, organization and project scopes whose file stores get mirrored.
    pub async fn file_store_scopes(&self) -> Result<Vec<TenantScope>, PlatformError> {
        let mut scopes = Vec::new();

        match self.filter_org() {
            Some(org) if self.filter_project().is_none() => {
                scopes.push(TenantScope::org(&self.account, org));
            }
            Some(_) => {}
            None => {
                scopes.push(self.account_scope());
                let orgs = self.platform.list_organizations(&self.account).await?;
                warn_if_truncated(
                    "organizations",
                    &self.account_scope(),
                    orgs.len(),
                    limits::ORGANIZATIONS,
                );
                scopes.extend(
                    orgs.into_iter()
                        .map(|org| TenantScope::org(&self.account, org.identifier)),
                );
            }
        }

        scopes.extend(self.project_scopes().await?);
        Ok(scopes)
    }

    /// Lists the entities of `kinds` in a project scope. A listing that fails
    /// is recorded against the scope and the other kinds are still listed.
    pub async fn entities(
        &self,
        scope: &TenantScope,
        kinds: &[EntityKind],
        report: &RunReport,
    ) -> Vec<MigratableEntity> {
        let org = scope.org_id().unwrap_or_default();
        let project = scope.project_id().unwrap_or_default();
        let mut entities = Vec::new();

        for kind in kinds {
            let listed: Result<Vec<MigratableEntity>, PlatformError> = match kind {
                EntityKind::Pipeline => self.platform.list_pipelines(scope).await.map(|items| {
                    warn_if_truncated("pipelines", scope, items.len(), limits::PIPELINES);
                    items
                        .into_iter()
                        .map(|p| MigratableEntity::Pipeline {
                            identifier: p.identifier,
                            org: org.to_string(),
                            project: project.to_string(),
                        })
                        .collect()
                }),
                EntityKind::Template => self.platform.list_templates(scope).await.map(|items| {
                    warn_if_truncated("templates", scope, items.len(), limits::TEMPLATES);
                    items
                        .into_iter()
                        .map(|t| MigratableEntity::Template {
                            identifier: t.identifier,
                            org: or_scope(t.org, org),
                            project: or_scope(t.project, project),
                            version_label: t.version_label,
                        })
                        .collect()
                }),
                EntityKind::Service => self.platform.list_services(scope).await.map(|items| {
                    warn_if_truncated("services", scope, items.len(), limits::SERVICES);
                    items
                        .into_iter()
                        .map(|s| MigratableEntity::Service {
                            identifier: s.identifier,
                            org: or_scope(s.org, org),
                            project: or_scope(s.project, project),
                        })
                        .collect()
                }),
                EntityKind::ServiceOverride | EntityKind::File => continue,
            };

            match listed {
                Ok(mut found) => {
                    debug!(scope = %scope, kind = %kind, count = found.len(), "listed entities");
                    entities.append(&mut found);
                }
                Err(err) => {
                    error!(scope = %scope, kind = %kind, error = %err, "failed to list entities");
                    report.record_scope_failure(scope, kind.as_str(), &err);
                }
            }
        }

        entities
    }

    /// Services and service overrides of a project scope that carry YAML.
    /// Listing failures are recorded against the scope.
    pub async fn manifest_owners(
        &self,
        scope: &TenantScope,
        report: &RunReport,
    ) -> Vec<ManifestOwner> {
        let mut owners = Vec::new();

        match self.platform.list_services(scope).await {
            Ok(services) => {
                warn_if_truncated("services", scope, services.len(), limits::SERVICES);
                owners.extend(services.into_iter().filter_map(|service| {
                    let yaml = service.yaml?;
                    Some(ManifestOwner::Service {
                        scope: scope.clone(),
                        identifier: service.identifier,
                        name: service.name,
                        yaml,
                    })
                }));
            }
            Err(err) => {
                error!(scope = %scope, error = %err, "failed to list services");
                report.record_scope_failure(scope, "services", &err);
            }
        }

        let environments = match self.platform.list_environments(scope).await {
            Ok(environments) => environments,
            Err(err) => {
                error!(scope = %scope, error = %err, "failed to list environments");
                report.record_scope_failure(scope, "environments", &err);
                return owners;
            }
        };

        for environment in environments {
            match self
                .platform
                .list_service_overrides(scope, &environment.identifier)
                .await
            {
                Ok(overrides) => {
                    owners.extend(overrides.into_iter().filter_map(|o| {
                        let yaml = o.yaml?;
                        Some(ManifestOwner::Override {
                            scope: scope.clone(),
                            environment: o.environment_ref,
                            service: o.service_ref,
                            yaml,
                        })
                    }));
                }
                Err(err) => {
                    error!(
                        scope = %scope,
                        environment = %environment.identifier,
                        error = %err,
                        "failed to list service overrides"
                    );
                    report.record_scope_failure(scope, "service overrides", &err);
                }
            }
        }

        debug!(scope = %scope, count = owners.len(), "listed manifest owners");
        owners
    }

    pub async fn inventory(&self, scope: &TenantScope, report: &RunReport) -> Inventory {
        let mut inventory = Inventory {
            scope: scope.to_string(),
            ..Inventory::default()
        };

        let kinds = [EntityKind::Pipeline, EntityKind::Template, EntityKind::Service];
        for entity in self.entities(scope, &kinds, report).await {
            match entity.kind() {
                EntityKind::Pipeline => inventory.pipelines += 1,
                EntityKind::Template => inventory.templates += 1,
                EntityKind::Service => inventory.services += 1,
                EntityKind::ServiceOverride | EntityKind::File => {}
            }
        }

        match self.platform.list_environments(scope).await {
            Ok(environments) => {
                inventory.environments = environments.len();
                for environment in environments {
                    match self
                        .platform
                        .list_service_overrides(scope, &environment.identifier)
                        .await
                    {
                        Ok(overrides) => inventory.service_overrides += overrides.len(),
                        Err(err) => report.record_scope_failure(scope, "service overrides", &err),
                    }
                }
            }
            Err(err) => report.record_scope_failure(scope, "environments", &err),
        }

        inventory
    }
}

fn or_scope(value: String, scope_value: &str) -> String {
    if value.is_empty() {
        scope_value.to_string()
    } else {
        value
    }
}

fn scope_or_skip(scope: Result<TenantScope, ScopeError>) -> Option<TenantScope> {
    match scope {
        Ok(scope) => Some(scope),
        Err(err) => {
            warn!(error = %err, "skipping malformed scope");
            None
        }
    }
}
