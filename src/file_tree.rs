use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::{
    cli::{GlobExpression, WorkDirExpression},
    event::MirrorEvent,
    platform::FileStoreEntry,
};

/// File-store entries keyed by their path relative to the scope root.
pub type Tree = BTreeMap<String, FileStoreEntry>;

/// Splits off entries whose relative path was already taken by an earlier
/// entry, so `/a.txt` and `a.txt` cannot both claim one file on disk.
pub fn dedupe_paths(entries: Vec<FileStoreEntry>) -> (Vec<FileStoreEntry>, Vec<FileStoreEntry>) {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .partition(|entry| seen.insert(relative_key(&entry.path)))
}

/// Keys entries by relative path. Later entries that collide with an earlier
/// key are dropped with a warning.
pub fn build_tree(entries: Vec<FileStoreEntry>) -> Tree {
    let (unique, duplicates) = dedupe_paths(entries);
    for entry in &duplicates {
        warn!(identifier = %entry.identifier, path = %entry.path, "duplicate file store path dropped");
    }

    unique
        .into_iter()
        .map(|entry| (relative_key(&entry.path), entry))
        .collect()
}

fn relative_key(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

pub trait FileTree {
    fn transform_tree(self, files: &Option<WorkDirExpression>) -> Tree;

    fn generate_events(&self) -> Vec<MirrorEvent>;
}

impl FileTree for Tree {
    fn transform_tree(self, files: &Option<WorkDirExpression>) -> Self {
        let expression = match files {
            Some(expression) => expression,
            None => return self,
        };

        self.into_iter()
            .filter(|(key, _)| matches_expression(expression, key))
            .collect()
    }

    fn generate_events(&self) -> Vec<MirrorEvent> {
        self.values()
            .map(|entry| match entry.is_folder {
                Some(true) => MirrorEvent::SkipFolder(entry.clone()),
                _ => MirrorEvent::Fetch(entry.clone()),
            })
            .collect()
    }
}

fn matches_expression(expression: &WorkDirExpression, key: &str) -> bool {
    match expression {
        WorkDirExpression::Path(prefix) => {
            let prefix = prefix.trim_matches('/');
            prefix.is_empty() || key == prefix || key.starts_with(&format!("{}/", prefix))
        }
        WorkDirExpression::Glob(GlobExpression::Single(pattern)) => pattern.matches(key),
        WorkDirExpression::Glob(GlobExpression::SingleWithExclude(include, exclude)) => {
            include.matches(key) && !exclude.matches(key)
        }
    }
}
