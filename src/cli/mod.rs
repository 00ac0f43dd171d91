pub mod common;
pub mod parser;
pub mod reader;

pub use common::*;
pub use parser::{
    parse_work_dir_expression, GlobExpression, MirrorSettings, ParsedConfig, WorkDirExpression,
};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parser::parse_config;
use reader::read_config;

#[derive(Parser, Debug)]
#[clap(name = "remotify", about = "Move inline platform entities to git storage")]
pub struct Args {
    #[clap(short, long, parse(from_os_str))]
    pub config: PathBuf,

    /// trace, debug, info, warn or error
    #[clap(long)]
    pub log_level: Option<String>,

    #[clap(long)]
    pub json_logs: bool,

    /// Also write the run report as JSON to this file
    #[clap(long, parse(from_os_str))]
    pub report: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move pipelines, templates and services to remote git storage
    Migrate,
    /// Point file-store manifests of services and overrides at the git target
    Manifests,
    /// Download file-store entries to the configured destination
    Mirror,
    /// Count entities per project without changing anything
    Inventory,
}

pub fn load_config(path: &Path) -> Result<ParsedConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read file `{:?}`", path))?;

    let config = read_config(&content)?;
    parse_config(config)
}
