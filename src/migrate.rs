//! Moves inline entities to remote git storage and repoints file-store
//! manifests at the same repository.
//!
//! Every entity is attempted independently: a failed or timed out call is
//! recorded against that entity and its siblings carry on.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::classify::{Classifier, Operation};
use crate::cli::GitTarget;
use crate::entity::{MigratableEntity, MoveRequest};
use crate::identity::{connector_scope, manifest_store_type};
use crate::manifests::{point_at_git, GitStore, ManifestOwner, ManifestUpdate, UpdateRequest};
use crate::platform::{Connector, Platform};
use crate::pool::{run_bounded, with_deadline, RunSettings};
use crate::report::{FailureKind, MigrationOutcome, OutcomeStatus, RunReport};
use crate::scope::TenantScope;

pub struct MigrationEngine {
    platform: Arc<dyn Platform>,
    target: GitTarget,
    classifier: Classifier,
    settings: RunSettings,
}

impl MigrationEngine {
    pub fn new(
        platform: Arc<dyn Platform>,
        target: GitTarget,
        classifier: Classifier,
        settings: RunSettings,
    ) -> Self {
        MigrationEngine {
            platform,
            target,
            classifier,
            settings,
        }
    }

    pub fn target(&self) -> &GitTarget {
        &self.target
    }

    /// Looks up the git connector once before any entity is moved. A missing
    /// connector only warns; the individual moves will report the failure.
    pub async fn preflight(&self, scope: &TenantScope) -> Option<Connector> {
        let reference = &self.target.connector_ref;
        let lookup_scope = connector_scope(reference, scope);

        match with_deadline(
            self.settings.deadline,
            self.platform.get_connector(&lookup_scope, reference),
        )
        .await
        {
            Ok(connector) => {
                info!(
                    connector = %connector.identifier,
                    store_type = manifest_store_type(&connector.kind),
                    repo = %self.target.repo_name,
                    branch = %self.target.branch_name,
                    "git connector resolved"
                );
                Some(connector)
            }
            Err(err) => {
                warn!(connector = %reference, error = %err, "could not resolve git connector");
                None
            }
        }
    }

    pub async fn move_to_remote(&self, entity: MigratableEntity) -> MigrationOutcome {
        let reference = entity.reference();
        let kind = entity.kind();
        let request = MoveRequest::inline_to_remote(entity, &self.target);

        let outcome = match with_deadline(
            self.settings.deadline,
            self.platform.move_config(&request),
        )
        .await
        {
            Ok(response) => MigrationOutcome::from_classification(
                reference,
                self.classifier
                    .classify_raw(&response, Operation::Move(kind)),
            ),
            Err(err) => MigrationOutcome::from_error(reference, &err),
        };

        match &outcome.status {
            OutcomeStatus::Moved => info!(entity = %outcome.entity, "moved to remote"),
            OutcomeStatus::AlreadySkipped => {
                info!(entity = %outcome.entity, "already remote, skipping")
            }
            status => error!(
                entity = %outcome.entity,
                status = ?status,
                detail = outcome.detail.as_deref().unwrap_or_default(),
                "failed to move to remote"
            ),
        }

        outcome
    }

    /// Moves every entity, recording each outcome in `report`.
    pub async fn migrate_all(&self, entities: Vec<MigratableEntity>, report: &RunReport) {
        info!(count = entities.len(), "moving entities to remote");
        run_bounded(&self.settings, entities, report, |entity| {
            self.move_to_remote(entity)
        })
        .await;
    }

    async fn apply_update(&self, update: ManifestUpdate) -> MigrationOutcome {
        let ManifestUpdate { reference, request } = update;
        let kind = reference.kind;
        let call = match &request {
            UpdateRequest::Service(body) => self.platform.update_service(body),
            UpdateRequest::Override(body) => self.platform.update_service_override(body),
        };

        let outcome = match with_deadline(self.settings.deadline, call).await {
            Ok(response) => MigrationOutcome::from_update(
                reference,
                self.classifier
                    .classify_raw(&response, Operation::Update(kind)),
            ),
            Err(err) => MigrationOutcome::from_error(reference, &err),
        };

        match &outcome.status {
            OutcomeStatus::Updated => info!(entity = %outcome.entity, "manifests now read from git"),
            status => error!(
                entity = %outcome.entity,
                status = ?status,
                detail = outcome.detail.as_deref().unwrap_or_default(),
                "failed to update manifests"
            ),
        }

        outcome
    }

    /// Rewrites the file-store manifests of every owner to `store` and sends
    /// the updated definitions. Owners without file-store manifests are left
    /// untouched and not recorded.
    pub async fn update_manifests(
        &self,
        owners: Vec<ManifestOwner>,
        store: &GitStore,
        report: &RunReport,
    ) {
        let mut updates = Vec::new();
        for owner in owners {
            match point_at_git(owner.yaml(), store, owner.scope()) {
                Ok(Some(yaml)) => updates.push(owner.with_yaml(yaml)),
                Ok(None) => debug!(entity = %owner.reference(), "no file store manifests"),
                Err(err) => {
                    let reference = owner.reference();
                    error!(entity = %reference, error = %err, "definition is not valid YAML");
                    report.record(MigrationOutcome::new(
                        reference,
                        OutcomeStatus::Failed(FailureKind::Domain),
                        Some(format!("definition is not valid YAML: {}", err)),
                    ));
                }
            }
        }

        info!(count = updates.len(), "pointing manifests at git");
        run_bounded(&self.settings, updates, report, |update| {
            self.apply_update(update)
        })
        .await;
    }
}
