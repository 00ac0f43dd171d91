use anyhow::{Context, Result};
use serde::Deserialize;

use super::common::{AlreadyRemotePolicy, EntitySelection, GitTarget, MirrorConfig, ScopeFilter};

/// The configuration file exactly as written, before validation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Config {
    pub version: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub account_identifier: Option<String>,
    pub git_details: Option<GitTarget>,
    pub migrate: Option<Vec<EntitySelection>>,
    #[serde(default)]
    pub scope: ScopeFilter,
    #[serde(default)]
    pub already_remote: AlreadyRemotePolicy,
    pub concurrency: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub mirror: Option<MirrorConfig>,
}

pub fn read_config(config: &str) -> Result<Config> {
    serde_yaml::from_str(config).context("configuration is not valid YAML for remotify")
}
