use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, MigratableEntity};

/// Git coordinates every move-to-remote call of a run points at.
///
/// `file_path` may carry `{kind}`, `{identifier}`, `{org}` and `{project}`
/// placeholders which are filled in per entity.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct GitTarget {
    pub connector_ref: String,
    pub repo_name: String,
    pub branch_name: String,
    pub file_path: String,
    pub commit_message: String,
}

/// Structured form of the git target, sent as the `git_details` body field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GitDetails {
    pub connector_ref: String,
    pub repo_name: String,
    pub branch_name: String,
    pub file_path: String,
    pub commit_message: String,
}

impl GitTarget {
    pub fn details_for(&self, entity: &MigratableEntity) -> GitDetails {
        GitDetails {
            connector_ref: self.connector_ref.clone(),
            repo_name: self.repo_name.clone(),
            branch_name: self.branch_name.clone(),
            file_path: render_file_path(&self.file_path, entity),
            commit_message: self.commit_message.clone(),
        }
    }
}

impl GitDetails {
    /// Flattened form used by the template and service move endpoints.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("connectorRef", self.connector_ref.clone()),
            ("repoName", self.repo_name.clone()),
            ("branch", self.branch_name.clone()),
            ("isNewBranch", "false".to_string()),
            ("filePath", self.file_path.clone()),
            ("commitMsg", self.commit_message.clone()),
        ]
    }
}

fn render_file_path(template: &str, entity: &MigratableEntity) -> String {
    template
        .replace("{kind}", entity.kind().as_str())
        .replace("{identifier}", entity.identifier())
        .replace("{org}", entity.org())
        .replace("{project}", entity.project())
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Deserialize)]
pub struct ScopeFilter {
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitySelection {
    Pipelines,
    Templates,
    Services,
}

impl EntitySelection {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntitySelection::Pipelines => EntityKind::Pipeline,
            EntitySelection::Templates => EntityKind::Template,
            EntitySelection::Services => EntityKind::Service,
        }
    }
}

/// Which move endpoints answer "is already remote" with a benign skip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlreadyRemotePolicy {
    Services,
    All,
}

impl Default for AlreadyRemotePolicy {
    fn default() -> Self {
        AlreadyRemotePolicy::Services
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MirrorConfig {
    pub destination: PathBuf,
    /// `glob("…")`, `glob("…", "exclude")` or a plain path prefix.
    pub files: Option<String>,
}
