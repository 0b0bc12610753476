//! Two-tier workspace synchronization core.
//!
//! Keeps a working set of tabs consistent between an always-available local
//! cache and an asynchronous remote key-value store.

pub mod cache;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod remote;
pub mod settings;
pub mod sync;

pub use cache::{LocalCache, SqliteLocalCache};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::schema::{ProductionTabSchema, TabSchema};
pub use model::snapshot::{SnapshotError, WorkspaceSnapshot};
pub use model::tab::{Tab, TabId};
pub use model::workspace::Workspace;
pub use notify::{LogNotifier, Notifier, NotifyLevel};
pub use remote::{FsRemoteStore, HttpRemoteStore, RemoteError, RemoteResult, RemoteStore};
pub use settings::{AutoSaveSettings, AUTO_SAVE_SETTINGS_KEY};
pub use sync::{
    InitOutcome, LoadOutcome, SaveOutcome, SavePhase, SaveTrigger, StorageKey, SyncCoordinator,
    SyncCoordinatorBuilder,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
