//! Result envelopes returned by coordinator operations.

use crate::remote::RemoteError;

/// Where the startup workspace came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// Remote data replaced the workspace and was mirrored locally.
    Remote { tabs: usize },
    /// Local data was used. `secondary` holds the follow-up remote load
    /// issued because the local content was not meaningful.
    Local {
        tabs: usize,
        secondary: Option<LoadOutcome>,
    },
    /// Neither tier had data; one empty tab was synthesized.
    Empty { secondary: LoadOutcome },
    /// A newer load replaced the workspace while startup was pending.
    Superseded,
    /// `initialize` already ran for this coordinator.
    AlreadyInitialized,
}

/// Result of a remote load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Workspace replaced with `tabs` tabs from the remote snapshot.
    Loaded { tabs: usize },
    /// Remote has nothing stored under the key; workspace untouched.
    NoData,
    /// A load issued later already replaced the workspace; result discarded.
    Stale,
    /// Remote call failed; workspace untouched.
    Failed(RemoteError),
}

/// Result of one guarded remote save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Another save was in flight; this attempt was dropped.
    Skipped,
    Failed(RemoteError),
}

/// What requested a remote save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// Debounce timer expiry.
    AutoSave,
    /// User-initiated save request.
    Explicit,
}

/// Observable state of the remote save pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    Idle,
    PendingDebounce,
    /// A save is in flight; a debounce timer may be armed as well.
    Saving,
}
