//! Repoints file-store manifests at git.
//!
//! Services and service overrides reference file-store content through
//! `store: { type: Harness, spec: { files: [...] } }`. Once the file store is
//! mirrored into the repository those stores are replaced by a git store on
//! the migration connector, with every reference translated to the path the
//! mirror writes it to (`account/...`, `org/<org>/...`,
//! `project/<org>/<project>/...`).

use serde_yaml::{Mapping, Value};

use crate::cli::GitTarget;
use crate::entity::{EntityKind, EntityRef};
use crate::identity::manifest_store_type;
use crate::platform::{Connector, OverrideUpdate, ServiceUpdate};
use crate::scope::TenantScope;

const FILE_STORE_TYPE: &str = "Harness";
const STORE_KEY: &str = "store";
const VALUES_PATHS_KEY: &str = "valuesPaths";

/// Git store every rewritten manifest points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitStore {
    pub store_type: String,
    pub connector_ref: String,
    pub repo_name: String,
    pub branch: String,
}

impl GitStore {
    pub fn new(target: &GitTarget, connector: &Connector) -> Self {
        GitStore {
            store_type: manifest_store_type(&connector.kind).to_string(),
            connector_ref: target.connector_ref.clone(),
            repo_name: target.repo_name.clone(),
            branch: target.branch_name.clone(),
        }
    }

    fn store(&self, paths: Vec<Value>) -> Value {
        let mut spec = Mapping::new();
        spec.insert("connectorRef".into(), self.connector_ref.as_str().into());
        spec.insert("gitFetchType".into(), "Branch".into());
        spec.insert("branch".into(), self.branch.as_str().into());
        spec.insert("repoName".into(), self.repo_name.as_str().into());
        spec.insert("paths".into(), Value::Sequence(paths));

        let mut store = Mapping::new();
        store.insert("type".into(), self.store_type.as_str().into());
        store.insert("spec".into(), Value::Mapping(spec));
        Value::Mapping(store)
    }
}

/// Repository path of a file-store reference owned by an entity in `owner`.
///
/// `account:/x` and `org:/x` name the wider scopes explicitly; a bare `/x`
/// lives in the owner's own scope. Returns `None` for references that cannot
/// be placed, such as `org:` from an account-level owner.
pub fn repo_path(reference: &str, owner: &TenantScope) -> Option<String> {
    let (prefix, path) = match reference.split_once(':') {
        Some((prefix, path)) => (Some(prefix), path),
        None => (None, reference),
    };
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return None;
    }

    let root = match (prefix, owner.org_id(), owner.project_id()) {
        (Some("account"), _, _) | (None, None, _) => "account".to_string(),
        (Some("org"), Some(org), _) | (None, Some(org), None) => format!("org/{}", org),
        (None, Some(org), Some(project)) => format!("project/{}/{}", org, project),
        _ => return None,
    };

    Some(format!("{}/{}", root, path))
}

struct Rewrite<'a> {
    store: &'a GitStore,
    owner: &'a TenantScope,
    count: usize,
}

impl Rewrite<'_> {
    fn value(&mut self, value: Value) -> Value {
        match value {
            Value::Mapping(mapping) => self.mapping(mapping),
            Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(|item| self.value(item)).collect())
            }
            other => other,
        }
    }

    fn mapping(&mut self, mapping: Mapping) -> Value {
        let repoint = mapping
            .get(&Value::from(STORE_KEY))
            .map_or(false, is_file_store);

        let mut rewritten = Mapping::new();
        for (key, child) in mapping {
            let child = match key.as_str() {
                Some(STORE_KEY) if repoint => {
                    self.count += 1;
                    self.store.store(self.paths(store_files(&child)))
                }
                Some(VALUES_PATHS_KEY) if repoint => match child {
                    Value::Sequence(items) => Value::Sequence(self.paths(items)),
                    other => other,
                },
                _ => self.value(child),
            };
            rewritten.insert(key, child);
        }
        Value::Mapping(rewritten)
    }

    fn paths(&self, references: Vec<Value>) -> Vec<Value> {
        references
            .into_iter()
            .map(|reference| {
                match reference
                    .as_str()
                    .and_then(|r| repo_path(r, self.owner))
                {
                    Some(path) => Value::String(path),
                    None => reference,
                }
            })
            .collect()
    }
}

fn is_file_store(store: &Value) -> bool {
    store
        .get("type")
        .and_then(Value::as_str)
        .map_or(false, |kind| kind == FILE_STORE_TYPE)
}

fn store_files(store: &Value) -> Vec<Value> {
    store
        .get("spec")
        .and_then(|spec| spec.get("files"))
        .and_then(Value::as_sequence)
        .cloned()
        .unwrap_or_default()
}

/// Rewrites every file-store manifest in `yaml`. `Ok(None)` when nothing
/// referenced the file store.
pub fn point_at_git(
    yaml: &str,
    store: &GitStore,
    owner: &TenantScope,
) -> Result<Option<String>, serde_yaml::Error> {
    let document: Value = serde_yaml::from_str(yaml)?;
    let mut rewrite = Rewrite {
        store,
        owner,
        count: 0,
    };
    let document = rewrite.value(document);

    if rewrite.count == 0 {
        return Ok(None);
    }

    let rendered = serde_yaml::to_string(&document)?;
    Ok(Some(rendered.trim_start_matches("---\n").to_string()))
}

/// A service or service override whose YAML may reference the file store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManifestOwner {
    Service {
        scope: TenantScope,
        identifier: String,
        name: String,
        yaml: String,
    },
    Override {
        scope: TenantScope,
        environment: String,
        service: String,
        yaml: String,
    },
}

impl ManifestOwner {
    pub fn scope(&self) -> &TenantScope {
        match self {
            ManifestOwner::Service { scope, .. } | ManifestOwner::Override { scope, .. } => scope,
        }
    }

    pub fn yaml(&self) -> &str {
        match self {
            ManifestOwner::Service { yaml, .. } | ManifestOwner::Override { yaml, .. } => yaml,
        }
    }

    pub fn reference(&self) -> EntityRef {
        let scope = self.scope();
        let (kind, identifier) = match self {
            ManifestOwner::Service { identifier, .. } => (EntityKind::Service, identifier.clone()),
            ManifestOwner::Override {
                environment,
                service,
                ..
            } => (
                EntityKind::ServiceOverride,
                format!("{}:{}", environment, service),
            ),
        };

        EntityRef {
            kind,
            identifier,
            org: scope.org_id().unwrap_or_default().to_string(),
            project: scope.project_id().unwrap_or_default().to_string(),
        }
    }

    /// The update call carrying `yaml` in place of the current definition.
    pub fn with_yaml(self, yaml: String) -> ManifestUpdate {
        let reference = self.reference();
        let request = match self {
            ManifestOwner::Service {
                scope,
                identifier,
                name,
                ..
            } => UpdateRequest::Service(ServiceUpdate {
                identifier,
                name,
                org_identifier: scope.org_id().unwrap_or_default().to_string(),
                project_identifier: scope.project_id().unwrap_or_default().to_string(),
                yaml,
            }),
            ManifestOwner::Override {
                scope,
                environment,
                service,
                ..
            } => UpdateRequest::Override(OverrideUpdate {
                environment_identifier: environment,
                service_identifier: service,
                org_identifier: scope.org_id().unwrap_or_default().to_string(),
                project_identifier: scope.project_id().unwrap_or_default().to_string(),
                yaml,
            }),
        };

        ManifestUpdate { reference, request }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateRequest {
    Service(ServiceUpdate),
    Override(OverrideUpdate),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestUpdate {
    pub reference: EntityRef,
    pub request: UpdateRequest,
}
