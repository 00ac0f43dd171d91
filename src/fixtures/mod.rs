//! Builders shared by unit and integration tests.

pub mod content;
pub mod filters;
