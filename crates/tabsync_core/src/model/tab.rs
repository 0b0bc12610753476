//! Tab domain model.
//!
//! # Invariants
//! - `id` is generated on construction and is never persisted; snapshots carry
//!   payloads only, so identity is re-minted on every load.

use serde_json::Value;
use uuid::Uuid;

/// Stable identifier for a tab within one process lifetime.
pub type TabId = Uuid;

/// Single unit of editable work with an opaque JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    id: TabId,
    payload: Value,
}

impl Tab {
    /// Creates a tab with a freshly generated id.
    pub fn new(payload: Value) -> Self {
        Self::with_id(Uuid::new_v4(), payload)
    }

    pub fn with_id(id: TabId, payload: Value) -> Self {
        Self { id, payload }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub(crate) fn payload_mut(&mut self) -> &mut Value {
        &mut self.payload
    }
}
