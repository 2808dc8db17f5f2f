//! Typed domain model shared across the workspace.

pub mod achievement;
pub mod record;
pub mod snapshot;
