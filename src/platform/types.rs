//! Listing records, limited to the fields the orchestration inspects.

use serde::{Deserialize, Serialize};

/// `{ "data": { "content": [...] } }` wrapper used by the `/ng/api` listings.
#[derive(Debug, Deserialize)]
pub struct DataPage<T> {
    pub data: Page<T>,
}

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct OrgItem {
    pub org: Organization,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub identifier: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectItem {
    pub project: Project,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub identifier: String,
    pub org_identifier: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub store_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub version_label: String,
}

#[derive(Debug, Deserialize)]
pub struct ServiceItem {
    pub service: ServiceSummary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub yaml: Option<String>,
}

/// Body of `PUT /ng/api/servicesV2`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpdate {
    pub identifier: String,
    pub name: String,
    pub org_identifier: String,
    pub project_identifier: String,
    pub yaml: String,
}

/// Body of `PUT /ng/api/environmentsV2/serviceOverrides`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideUpdate {
    pub environment_identifier: String,
    pub service_identifier: String,
    pub org_identifier: String,
    pub project_identifier: String,
    pub yaml: String,
}

#[derive(Debug, Deserialize)]
pub struct EnvironmentItem {
    pub environment: Environment,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub org_identifier: Option<String>,
    #[serde(default)]
    pub project_identifier: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOverride {
    pub environment_ref: String,
    pub service_ref: String,
    #[serde(default)]
    pub org_identifier: Option<String>,
    #[serde(default)]
    pub project_identifier: Option<String>,
    #[serde(default)]
    pub yaml: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectorResponse {
    pub data: ConnectorData,
}

#[derive(Debug, Deserialize)]
pub struct ConnectorData {
    pub connector: Connector,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub spec: ConnectorSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSpec {
    #[serde(default)]
    pub url: Option<String>,
}

/// File store node as the platform reports it.
#[derive(Clone, Debug, Deserialize)]
pub struct FileStoreNode {
    pub identifier: String,
    pub path: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileStoreEntry {
    pub identifier: String,
    pub path: String,
    /// `None` when the platform did not say whether this is a folder.
    pub is_folder: Option<bool>,
}

impl FileStoreEntry {
    pub fn file(identifier: impl Into<String>, path: impl Into<String>) -> Self {
        FileStoreEntry {
            identifier: identifier.into(),
            path: path.into(),
            is_folder: Some(false),
        }
    }

    pub fn folder(identifier: impl Into<String>, path: impl Into<String>) -> Self {
        FileStoreEntry {
            identifier: identifier.into(),
            path: path.into(),
            is_folder: Some(true),
        }
    }
}

impl From<FileStoreNode> for FileStoreEntry {
    fn from(node: FileStoreNode) -> Self {
        let is_folder = match node.kind.as_deref() {
            Some("FOLDER") => Some(true),
            Some("FILE") => Some(false),
            _ => None,
        };

        FileStoreEntry {
            identifier: node.identifier,
            path: node.path,
            is_folder,
        }
    }
}
