//! Workspace domain model.
//!
//! # Responsibility
//! - Define tabs, their opaque payloads and the ordered workspace owning them.
//! - Define the serialized snapshot shared by both storage tiers.
//!
//! # Invariants
//! - Every tab is identified by a stable, process-local `TabId`.
//! - `active` and `selected` only ever name tabs currently in the workspace.

pub mod schema;
pub mod snapshot;
pub mod tab;
pub mod workspace;
