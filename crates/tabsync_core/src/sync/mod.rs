//! Two-tier synchronization engine.
//!
//! # Responsibility
//! - Populate the workspace at startup, remote first with local fallback.
//! - Mirror every mutation to the local cache and debounce remote writes.
//! - Guard remote saves so at most one is in flight.
//!
//! # Invariants
//! - The local cache always holds the serialized current workspace.
//! - Remote failures never surface as errors; they become fallbacks,
//!   dropped saves and notifications.

mod coordinator;
mod key;
mod outcome;

pub use coordinator::{SyncCoordinator, SyncCoordinatorBuilder};
pub use key::StorageKey;
pub use outcome::{InitOutcome, LoadOutcome, SaveOutcome, SavePhase, SaveTrigger};
