use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cli::{GitDetails, GitTarget};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Pipeline,
    Template,
    Service,
    ServiceOverride,
    File,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Pipeline => "pipeline",
            EntityKind::Template => "template",
            EntityKind::Service => "service",
            EntityKind::ServiceOverride => "service_override",
            EntityKind::File => "file",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configuration entity that can be moved from inline to remote storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MigratableEntity {
    Pipeline {
        identifier: String,
        org: String,
        project: String,
    },
    Template {
        identifier: String,
        org: String,
        project: String,
        version_label: String,
    },
    Service {
        identifier: String,
        org: String,
        project: String,
    },
}

impl MigratableEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            MigratableEntity::Pipeline { .. } => EntityKind::Pipeline,
            MigratableEntity::Template { .. } => EntityKind::Template,
            MigratableEntity::Service { .. } => EntityKind::Service,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            MigratableEntity::Pipeline { identifier, .. }
            | MigratableEntity::Template { identifier, .. }
            | MigratableEntity::Service { identifier, .. } => identifier,
        }
    }

    pub fn org(&self) -> &str {
        match self {
            MigratableEntity::Pipeline { org, .. }
            | MigratableEntity::Template { org, .. }
            | MigratableEntity::Service { org, .. } => org,
        }
    }

    pub fn project(&self) -> &str {
        match self {
            MigratableEntity::Pipeline { project, .. }
            | MigratableEntity::Template { project, .. }
            | MigratableEntity::Service { project, .. } => project,
        }
    }

    pub fn reference(&self) -> EntityRef {
        EntityRef {
            kind: self.kind(),
            identifier: self.identifier().to_string(),
            org: self.org().to_string(),
            project: self.project().to_string(),
        }
    }
}

/// Names an entity in the run report.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub identifier: String,
    pub org: String,
    pub project: String,
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.kind)?;
        if !self.org.is_empty() {
            write!(f, "{}/", self.org)?;
        }
        if !self.project.is_empty() {
            write!(f, "{}/", self.project)?;
        }
        write!(f, "{}", self.identifier)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MoveConfigOperation {
    #[serde(rename = "INLINE_TO_REMOTE")]
    InlineToRemote,
}

impl MoveConfigOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveConfigOperation::InlineToRemote => "INLINE_TO_REMOTE",
        }
    }
}

/// Everything a platform needs to issue one move-config call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    pub entity: MigratableEntity,
    pub git: GitDetails,
    pub operation: MoveConfigOperation,
}

impl MoveRequest {
    pub fn inline_to_remote(entity: MigratableEntity, target: &GitTarget) -> Self {
        let git = target.details_for(&entity);
        MoveRequest {
            entity,
            git,
            operation: MoveConfigOperation::InlineToRemote,
        }
    }
}
