pub mod classify;
pub mod cli;
pub mod entity;
pub mod error;
pub mod event;
pub mod file_tree;
pub mod fixtures;
pub mod hierarchy;
pub mod identity;
pub mod logging;
pub mod manifests;
pub mod migrate;
pub mod mirror;
pub mod orchestrator;
pub mod platform;
pub mod pool;
pub mod report;
pub mod scope;
