//! Reconstructs a scope's file store under a local directory.
//!
//! Every entry is resolved against its scope root before anything touches the
//! disk; paths that would land outside the root are rejected.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::classify::{Classification, Classifier, Operation};
use crate::cli::WorkDirExpression;
use crate::entity::{EntityKind, EntityRef};
use crate::error::{MirrorError, PlatformError};
use crate::event::MirrorEvent;
use crate::file_tree::{build_tree, dedupe_paths, FileTree};
use crate::hierarchy::warn_if_truncated;
use crate::platform::{limits, FileStoreEntry, Platform};
use crate::pool::{run_bounded, with_deadline, RunSettings};
use crate::report::{FailureKind, MigrationOutcome, OutcomeStatus, RunReport};
use crate::scope::{ScopeLevel, TenantScope};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadResult {
    Written(PathBuf),
    SkippedFolder,
}

pub struct FileStoreMirror {
    platform: Arc<dyn Platform>,
    destination: PathBuf,
    filter: Option<WorkDirExpression>,
    classifier: Classifier,
    settings: RunSettings,
    created_dirs: Mutex<HashSet<PathBuf>>,
}

/// Joins `relative` onto `root` without following symlinks, refusing
/// absolute paths and `..` segments that climb above `root`.
pub fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf, MirrorError> {
    let unsafe_path = || MirrorError::UnsafePath {
        path: relative.to_string(),
        root: root.to_path_buf(),
    };

    let mut resolved = PathBuf::new();
    for component in Path::new(relative.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(unsafe_path());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(unsafe_path()),
        }
    }

    if resolved.as_os_str().is_empty() {
        return Err(unsafe_path());
    }

    Ok(root.join(resolved))
}

/// `account/`, `org/<org>/` or `project/<org>/<project>/` under `destination`.
pub fn scope_root(destination: &Path, scope: &TenantScope) -> Result<PathBuf, MirrorError> {
    let relative = match (scope.level(), scope.org_id(), scope.project_id()) {
        (ScopeLevel::Project, Some(org), Some(project)) => {
            format!("project/{}/{}", org, project)
        }
        (ScopeLevel::Organization, Some(org), _) => format!("org/{}", org),
        _ => "account".to_string(),
    };

    let root = resolve_within(destination, &relative)?;
    let expected = destination.components().count() + relative.split('/').count();
    if root.components().count() != expected {
        return Err(MirrorError::UnsafePath {
            path: relative,
            root: destination.to_path_buf(),
        });
    }
    Ok(root)
}

/// Fails when `target` already exists as a symlink. Writes would follow it.
async fn refuse_symlink(target: &Path, root: &Path) -> Result<(), MirrorError> {
    match tokio::fs::symlink_metadata(target).await {
        Ok(metadata) if metadata.file_type().is_symlink() => Err(MirrorError::UnsafePath {
            path: target.display().to_string(),
            root: root.to_path_buf(),
        }),
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(MirrorError::io(target, err)),
    }
}

fn file_ref(scope: &TenantScope, entry: &FileStoreEntry) -> EntityRef {
    EntityRef {
        kind: EntityKind::File,
        identifier: entry.path.trim_start_matches('/').to_string(),
        org: scope.org_id().unwrap_or_default().to_string(),
        project: scope.project_id().unwrap_or_default().to_string(),
    }
}

fn failure_kind(error: &MirrorError) -> FailureKind {
    match error {
        MirrorError::Platform(err) if err.is_transport() => FailureKind::Transport,
        MirrorError::Platform(_) => FailureKind::Domain,
        MirrorError::UnsafePath { .. } | MirrorError::Io { .. } => FailureKind::Filesystem,
    }
}

impl FileStoreMirror {
    pub fn new(
        platform: Arc<dyn Platform>,
        destination: impl Into<PathBuf>,
        filter: Option<WorkDirExpression>,
        settings: RunSettings,
    ) -> Self {
        FileStoreMirror {
            platform,
            destination: destination.into(),
            filter,
            classifier: Classifier::default(),
            settings,
            created_dirs: Mutex::new(HashSet::new()),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Downloads one entry into `root`, the on-disk root of `scope`.
    pub async fn download_entry(
        &self,
        entry: &FileStoreEntry,
        scope: &TenantScope,
        root: &Path,
    ) -> Result<DownloadResult, MirrorError> {
        if entry.is_folder == Some(true) {
            return Ok(DownloadResult::SkippedFolder);
        }

        let target = resolve_within(root, &entry.path)?;

        let response = with_deadline(
            self.settings.deadline,
            self.platform.download_file(scope, &entry.identifier),
        )
        .await?;

        match self.classifier.classify_raw(&response, Operation::Download) {
            Classification::Success => {}
            Classification::FolderNotDownloadable => return Ok(DownloadResult::SkippedFolder),
            Classification::TransportError { detail, .. } => {
                return Err(PlatformError::transport(entry.path.clone(), detail).into())
            }
            Classification::DomainError { status, detail } => {
                return Err(PlatformError::Domain { status, detail }.into())
            }
            Classification::AlreadyRemote => {
                return Err(PlatformError::Domain {
                    status: response.status,
                    detail: "unexpected already-remote answer to a download".to_string(),
                }
                .into())
            }
        }

        // Entries without a type are folder markers when their path has no dot.
        if entry.is_folder.is_none() && !entry.path.contains('.') {
            return Ok(DownloadResult::SkippedFolder);
        }

        self.ensure_parent(&target, root).await?;
        refuse_symlink(&target, root).await?;
        tokio::fs::write(&target, &response.body)
            .await
            .map_err(|e| MirrorError::io(&target, e))?;

        Ok(DownloadResult::Written(target))
    }

    async fn ensure_parent(&self, target: &Path, root: &Path) -> Result<(), MirrorError> {
        let parent = match target.parent() {
            Some(parent) => parent,
            None => return Ok(()),
        };

        {
            let mut created = self.created_dirs.lock().await;
            if !created.contains(parent) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| MirrorError::io(parent, e))?;
                created.insert(parent.to_path_buf());
            }
        }

        let canonical_root = tokio::fs::canonicalize(root)
            .await
            .map_err(|e| MirrorError::io(root, e))?;
        let canonical_parent = tokio::fs::canonicalize(parent)
            .await
            .map_err(|e| MirrorError::io(parent, e))?;

        if !canonical_parent.starts_with(&canonical_root) {
            return Err(MirrorError::UnsafePath {
                path: target.display().to_string(),
                root: canonical_root,
            });
        }

        Ok(())
    }

    async fn fetch(
        &self,
        entry: FileStoreEntry,
        scope: &TenantScope,
        root: &Path,
    ) -> MigrationOutcome {
        let reference = file_ref(scope, &entry);

        match self.download_entry(&entry, scope, root).await {
            Ok(DownloadResult::Written(path)) => {
                info!(entity = %reference, path = %path.display(), "downloaded");
                MigrationOutcome::new(reference, OutcomeStatus::Downloaded, None)
            }
            Ok(DownloadResult::SkippedFolder) => {
                debug!(entity = %reference, "folder, skipping");
                MigrationOutcome::new(reference, OutcomeStatus::FolderSkipped, None)
            }
            Err(err) => {
                error!(entity = %reference, error = %err, "failed to download");
                MigrationOutcome::new(
                    reference,
                    OutcomeStatus::Failed(failure_kind(&err)),
                    Some(err.to_string()),
                )
            }
        }
    }

    /// Mirrors every entry of `scope` that passes the configured filter.
    pub async fn mirror_scope(&self, scope: &TenantScope, report: &RunReport) {
        let root = match scope_root(&self.destination, scope) {
            Ok(root) => root,
            Err(err) => {
                error!(scope = %scope, error = %err, "cannot place scope on disk");
                report.record_scope_failure(scope, "files", &err);
                return;
            }
        };

        let entries = match with_deadline(self.settings.deadline, self.platform.list_files(scope))
            .await
        {
            Ok(entries) => entries,
            Err(err) => {
                error!(scope = %scope, error = %err, "failed to list file store");
                report.record_scope_failure(scope, "files", &err);
                return;
            }
        };
        warn_if_truncated("files", scope, entries.len(), limits::FILES);

        let (entries, duplicates) = dedupe_paths(entries);
        for entry in duplicates {
            warn!(scope = %scope, path = %entry.path, "another entry already maps to this path");
            report.record(MigrationOutcome::new(
                file_ref(scope, &entry),
                OutcomeStatus::Failed(FailureKind::Filesystem),
                Some(format!(
                    "entry `{}` shares its path with another file store entry",
                    entry.identifier
                )),
            ));
        }

        let events = build_tree(entries)
            .transform_tree(&self.filter)
            .generate_events();

        let mut fetches = Vec::new();
        for event in events {
            match event {
                MirrorEvent::SkipFolder(entry) => {
                    report.record(MigrationOutcome::new(
                        file_ref(scope, &entry),
                        OutcomeStatus::FolderSkipped,
                        None,
                    ));
                }
                MirrorEvent::Fetch(entry) => fetches.push(entry),
            }
        }

        info!(scope = %scope, count = fetches.len(), root = %root.display(), "mirroring file store");
        let root = root.as_path();
        run_bounded(&self.settings, fetches, report, |entry| {
            self.fetch(entry, scope, root)
        })
        .await;
    }
}
