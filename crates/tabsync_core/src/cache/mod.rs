//! Local cache tier.
//!
//! # Responsibility
//! - Provide the synchronous key -> JSON blob store that backs every
//!   workspace mutation.
//!
//! # Invariants
//! - `save` and `load` never fail from the caller's perspective; storage
//!   faults are logged and degrade to "write dropped" / "absent".
//! - Malformed stored JSON is reported as absent, never as an error.

mod sqlite;

pub use sqlite::SqliteLocalCache;

use serde_json::Value;

/// Synchronous key -> JSON store that is always available.
pub trait LocalCache: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &Value);

    /// Returns the stored value for `key`, or `None` when absent/unreadable.
    fn load(&self, key: &str) -> Option<Value>;

    /// Returns the stored value for `key`, falling back to `default`.
    fn load_or(&self, key: &str, default: Value) -> Value {
        self.load(key).unwrap_or(default)
    }
}
