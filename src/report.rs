use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::classify::Classification;
use crate::entity::EntityRef;
use crate::error::PlatformError;
use crate::scope::TenantScope;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Domain,
    Transport,
    Filesystem,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Moved,
    Updated,
    AlreadySkipped,
    Downloaded,
    FolderSkipped,
    Failed(FailureKind),
}

impl OutcomeStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, OutcomeStatus::Failed(_))
    }
}

/// Result of one attempted entity. Never changed once recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    pub entity: EntityRef,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl MigrationOutcome {
    pub fn new(entity: EntityRef, status: OutcomeStatus, detail: Option<String>) -> Self {
        MigrationOutcome {
            entity,
            status,
            detail,
        }
    }

    /// Outcome of a move call given its classification.
    pub fn from_classification(entity: EntityRef, classification: Classification) -> Self {
        match classification {
            Classification::Success => Self::new(entity, OutcomeStatus::Moved, None),
            Classification::AlreadyRemote => {
                Self::new(entity, OutcomeStatus::AlreadySkipped, None)
            }
            Classification::FolderNotDownloadable => {
                Self::new(entity, OutcomeStatus::FolderSkipped, None)
            }
            Classification::DomainError { detail, .. } => Self::new(
                entity,
                OutcomeStatus::Failed(FailureKind::Domain),
                Some(detail),
            ),
            Classification::TransportError { detail, .. } => Self::new(
                entity,
                OutcomeStatus::Failed(FailureKind::Transport),
                Some(detail),
            ),
        }
    }

    /// Outcome of a manifest update call given its classification.
    pub fn from_update(entity: EntityRef, classification: Classification) -> Self {
        match classification {
            Classification::Success => Self::new(entity, OutcomeStatus::Updated, None),
            other => Self::from_classification(entity, other),
        }
    }

    pub fn from_error(entity: EntityRef, error: &PlatformError) -> Self {
        let kind = if error.is_transport() {
            FailureKind::Transport
        } else {
            FailureKind::Domain
        };
        Self::new(entity, OutcomeStatus::Failed(kind), Some(error.to_string()))
    }
}

/// A listing that could not be fetched for one scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScopeFailure {
    pub scope: String,
    pub resource: String,
    pub detail: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub moved: usize,
    pub updated: usize,
    pub already_skipped: usize,
    pub downloaded: usize,
    pub folder_skipped: usize,
    pub failed: usize,
    pub not_attempted: usize,
    pub scope_failures: usize,
}

/// Outcomes of a whole run. Safe to append to from concurrent tasks.
#[derive(Debug, Default)]
pub struct RunReport {
    outcomes: Mutex<Vec<MigrationOutcome>>,
    scope_failures: Mutex<Vec<ScopeFailure>>,
    not_attempted: AtomicUsize,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    summary: ReportSummary,
    outcomes: &'a [MigrationOutcome],
    scope_failures: &'a [ScopeFailure],
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: MigrationOutcome) {
        locked(&self.outcomes).push(outcome);
    }

    pub fn record_scope_failure(
        &self,
        scope: &TenantScope,
        resource: &str,
        error: &dyn fmt::Display,
    ) {
        locked(&self.scope_failures).push(ScopeFailure {
            scope: scope.to_string(),
            resource: resource.to_string(),
            detail: error.to_string(),
        });
    }

    pub fn add_not_attempted(&self, count: usize) {
        self.not_attempted.fetch_add(count, Ordering::SeqCst);
    }

    pub fn outcomes(&self) -> Vec<MigrationOutcome> {
        locked(&self.outcomes).clone()
    }

    pub fn scope_failures(&self) -> Vec<ScopeFailure> {
        locked(&self.scope_failures).clone()
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            not_attempted: self.not_attempted.load(Ordering::SeqCst),
            scope_failures: locked(&self.scope_failures).len(),
            ..ReportSummary::default()
        };

        for outcome in locked(&self.outcomes).iter() {
            match outcome.status {
                OutcomeStatus::Moved => summary.moved += 1,
                OutcomeStatus::Updated => summary.updated += 1,
                OutcomeStatus::AlreadySkipped => summary.already_skipped += 1,
                OutcomeStatus::Downloaded => summary.downloaded += 1,
                OutcomeStatus::FolderSkipped => summary.folder_skipped += 1,
                OutcomeStatus::Failed(_) => summary.failed += 1,
            }
        }

        summary
    }

    pub fn has_failures(&self) -> bool {
        let summary = self.summary();
        summary.failed > 0 || summary.scope_failures > 0
    }

    /// An aborted run left entities behind.
    pub fn is_interrupted(&self) -> bool {
        self.not_attempted.load(Ordering::SeqCst) > 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_failures() || self.is_interrupted() {
            1
        } else {
            0
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let outcomes = self.outcomes();
        let scope_failures = self.scope_failures();
        serde_json::to_string_pretty(&ReportDocument {
            summary: self.summary(),
            outcomes: &outcomes,
            scope_failures: &scope_failures,
        })
    }
}
