use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;

use super::{
    common::{AlreadyRemotePolicy, EntitySelection, GitTarget, ScopeFilter},
    reader,
};
use crate::entity::EntityKind;
use crate::identity::resolve_account_id;
use crate::pool::{DEFAULT_CONCURRENCY, DEFAULT_DEADLINE};
use crate::scope::TenantScope;

#[derive(Clone, Debug)]
pub struct ParsedConfig {
    pub version: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub account: String,
    pub git_target: Option<GitTarget>,
    pub kinds: Vec<EntityKind>,
    pub scope: ScopeFilter,
    pub already_remote: AlreadyRemotePolicy,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub mirror: Option<MirrorSettings>,
}

#[derive(Clone, Debug)]
pub struct MirrorSettings {
    pub destination: PathBuf,
    pub files: Option<WorkDirExpression>,
}

#[derive(Debug, Clone)]
pub enum WorkDirExpression {
    Glob(GlobExpression),
    Path(String),
}

#[derive(Debug, Clone)]
pub enum GlobExpression {
    Single(glob::Pattern),
    SingleWithExclude(glob::Pattern, glob::Pattern),
}

pub fn parse_config(config: reader::Config) -> Result<ParsedConfig> {
    let account = match config.account_identifier.filter(|id| !id.is_empty()) {
        Some(account) => account,
        None => resolve_account_id(&config.api_key)?,
    };

    let scope = config.scope;
    TenantScope::new(
        &account,
        scope.org.clone().unwrap_or_default(),
        scope.project.clone().unwrap_or_default(),
    )
    .context("invalid scope restriction")?;

    let kinds = config
        .migrate
        .unwrap_or_else(|| {
            vec![
                EntitySelection::Pipelines,
                EntitySelection::Templates,
                EntitySelection::Services,
            ]
        })
        .iter()
        .map(EntitySelection::kind)
        .collect();

    let concurrency = config.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
    if concurrency == 0 {
        bail!("concurrency must be at least 1");
    }

    let request_timeout = match config.request_timeout_secs {
        Some(0) => bail!("request_timeout_secs must be at least 1"),
        Some(secs) => Duration::from_secs(secs),
        None => DEFAULT_DEADLINE,
    };

    let mirror = match config.mirror {
        Some(mirror) => Some(MirrorSettings {
            destination: mirror.destination,
            files: mirror
                .files
                .as_deref()
                .map(parse_work_dir_expression)
                .transpose()?,
        }),
        None => None,
    };

    Ok(ParsedConfig {
        version: config.version,
        api_key: config.api_key,
        base_url: config.base_url,
        account,
        git_target: config.git_details,
        kinds,
        scope,
        already_remote: config.already_remote,
        concurrency,
        request_timeout,
        mirror,
    })
}

pub fn parse_work_dir_expression(val: &str) -> Result<WorkDirExpression> {
    if val.starts_with("glob(") {
        parse_glob_expression(val)
    } else {
        Ok(parse_path_expression(val))
    }
}

fn parse_path_expression(val: &str) -> WorkDirExpression {
    WorkDirExpression::Path(val.to_string())
}

fn parse_glob_expression(val: &str) -> Result<WorkDirExpression> {
    let re = Regex::new(r#"^glob\("([^"]*)"(?:,\s*"([^"]*)")?\)$"#)?;
    let captures = re
        .captures(val)
        .ok_or_else(|| anyhow!("invalid glob string `{}`", val))?;

    let include = compile_pattern(&captures[1])?;

    match captures.get(2) {
        Some(exclude) => Ok(WorkDirExpression::Glob(GlobExpression::SingleWithExclude(
            include,
            compile_pattern(exclude.as_str())?,
        ))),
        None => Ok(WorkDirExpression::Glob(GlobExpression::Single(include))),
    }
}

fn compile_pattern(pattern: &str) -> Result<glob::Pattern> {
    glob::Pattern::new(pattern).with_context(|| format!("invalid glob pattern `{}`", pattern))
}
