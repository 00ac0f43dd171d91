//! Drives one run: enumerates scopes and hands them to the migration engine,
//! the manifest update, the file-store mirror or the inventory.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{error, info, warn};

use crate::classify::Classifier;
use crate::cli::ParsedConfig;
use crate::cli::GitTarget;
use crate::hierarchy::{Hierarchy, Inventory};
use crate::manifests::GitStore;
use crate::migrate::MigrationEngine;
use crate::mirror::FileStoreMirror;
use crate::platform::Platform;
use crate::pool::{AbortSignal, RunSettings};
use crate::report::RunReport;

pub struct Orchestrator {
    platform: Arc<dyn Platform>,
    config: ParsedConfig,
    abort: AbortSignal,
}

impl Orchestrator {
    pub fn new(platform: Arc<dyn Platform>, config: ParsedConfig, abort: AbortSignal) -> Self {
        Orchestrator {
            platform,
            config,
            abort,
        }
    }

    fn hierarchy(&self) -> Hierarchy {
        Hierarchy::new(
            self.platform.clone(),
            &self.config.account,
            self.config.scope.clone(),
        )
    }

    fn settings(&self) -> RunSettings {
        RunSettings::default()
            .with_concurrency(self.config.concurrency)
            .with_deadline(self.config.request_timeout)
            .with_abort(self.abort.clone())
    }

    fn git_target(&self) -> Result<GitTarget> {
        self.config
            .git_target
            .clone()
            .ok_or_else(|| anyhow!("`git_details` must be configured to migrate"))
    }

    fn engine(&self, target: GitTarget) -> MigrationEngine {
        MigrationEngine::new(
            self.platform.clone(),
            target,
            Classifier::new(self.config.already_remote),
            self.settings(),
        )
    }

    /// Moves every selected entity of every project in scope.
    ///
    /// Fails only when no git target is configured. An unavailable project
    /// listing is recorded as a scope failure.
    pub async fn migrate(&self, report: &RunReport) -> Result<()> {
        let hierarchy = self.hierarchy();
        let engine = self.engine(self.git_target()?);

        let scopes = match hierarchy.project_scopes().await {
            Ok(scopes) => scopes,
            Err(err) => {
                error!(error = %err, "failed to list projects");
                report.record_scope_failure(&hierarchy.account_scope(), "projects", &err);
                return Ok(());
            }
        };

        if let Some(first) = scopes.first() {
            engine.preflight(first).await;
        }

        info!(scopes = scopes.len(), kinds = ?self.config.kinds, "starting migration");
        for scope in &scopes {
            if self.abort.is_aborted() {
                warn!(scope = %scope, "aborted, remaining scopes not visited");
                break;
            }

            let entities = hierarchy.entities(scope, &self.config.kinds, report).await;
            if self.abort.is_aborted() {
                report.add_not_attempted(entities.len());
                break;
            }
            engine.migrate_all(entities, report).await;
        }

        Ok(())
    }

    /// Points the file-store manifests of every service and service override
    /// in scope at the git target.
    ///
    /// The git connector must resolve: its type decides the store type the
    /// rewritten manifests carry.
    pub async fn update_manifests(&self, report: &RunReport) -> Result<()> {
        let target = self.git_target()?;
        let hierarchy = self.hierarchy();
        let engine = self.engine(target.clone());

        let scopes = match hierarchy.project_scopes().await {
            Ok(scopes) => scopes,
            Err(err) => {
                error!(error = %err, "failed to list projects");
                report.record_scope_failure(&hierarchy.account_scope(), "projects", &err);
                return Ok(());
            }
        };

        let first = match scopes.first() {
            Some(first) => first,
            None => return Ok(()),
        };
        let connector = engine.preflight(first).await.ok_or_else(|| {
            anyhow!(
                "git connector `{}` could not be resolved, manifest store type is unknown",
                target.connector_ref
            )
        })?;
        let store = GitStore::new(&target, &connector);

        info!(scopes = scopes.len(), store_type = %store.store_type, "updating manifests");
        for scope in &scopes {
            if self.abort.is_aborted() {
                warn!(scope = %scope, "aborted, remaining scopes not visited");
                break;
            }

            let owners = hierarchy.manifest_owners(scope, report).await;
            if self.abort.is_aborted() {
                report.add_not_attempted(owners.len());
                break;
            }
            engine.update_manifests(owners, &store, report).await;
        }

        Ok(())
    }

    /// Mirrors the file store of the account, every organization and every
    /// project in scope.
    pub async fn mirror(&self, report: &RunReport) -> Result<()> {
        let settings = self
            .config
            .mirror
            .clone()
            .ok_or_else(|| anyhow!("`mirror` must be configured to mirror the file store"))?;

        let hierarchy = self.hierarchy();
        let mirror = FileStoreMirror::new(
            self.platform.clone(),
            settings.destination,
            settings.files,
            self.settings(),
        );

        let scopes = match hierarchy.file_store_scopes().await {
            Ok(scopes) => scopes,
            Err(err) => {
                error!(error = %err, "failed to enumerate file store scopes");
                report.record_scope_failure(&hierarchy.account_scope(), "scopes", &err);
                return Ok(());
            }
        };

        info!(
            scopes = scopes.len(),
            destination = %mirror.destination().display(),
            "starting file store mirror"
        );
        for scope in &scopes {
            if self.abort.is_aborted() {
                warn!(scope = %scope, "aborted, remaining scopes not visited");
                break;
            }
            mirror.mirror_scope(scope, report).await;
        }

        Ok(())
    }

    /// Per-project entity counts. Changes nothing on the platform.
    pub async fn inventory(&self, report: &RunReport) -> Vec<Inventory> {
        let hierarchy = self.hierarchy();

        let scopes = match hierarchy.project_scopes().await {
            Ok(scopes) => scopes,
            Err(err) => {
                error!(error = %err, "failed to list projects");
                report.record_scope_failure(&hierarchy.account_scope(), "projects", &err);
                return Vec::new();
            }
        };

        let mut inventories = Vec::with_capacity(scopes.len());
        for scope in &scopes {
            if self.abort.is_aborted() {
                break;
            }
            inventories.push(hierarchy.inventory(scope, report).await);
        }
        inventories
    }
}
