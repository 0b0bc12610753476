//! Payload schema hooks.
//!
//! The coordinator treats payloads as opaque; the few payload facts it needs
//! (blank payload, clone shape, meaningful content) come from a `TabSchema`.

use serde_json::{json, Value};

/// Payload knowledge supplied by the tab schema owner.
pub trait TabSchema: Send + Sync {
    /// Payload for a freshly created, empty tab.
    fn empty_payload(&self) -> Value;

    /// Payload for a clone of `source`.
    fn clone_payload(&self, source: &Value) -> Value;

    /// Whether the payload holds user content worth preserving.
    fn is_meaningful(&self, payload: &Value) -> bool;
}

const DEFAULT_TAB_NAME: &str = "Production line";
const CLONE_PREFIX: &str = "Clone: ";

/// Schema for production-planner tabs:
/// `{"metadata": {"name": ..}, "request": {"production": [..], "input": [..], ..}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductionTabSchema;

impl TabSchema for ProductionTabSchema {
    fn empty_payload(&self) -> Value {
        json!({
            "metadata": {
                "name": DEFAULT_TAB_NAME,
            },
            "request": {
                "production": [],
                "input": [],
            },
        })
    }

    fn clone_payload(&self, source: &Value) -> Value {
        let mut payload = self.empty_payload();
        if let Some(request) = source.get("request") {
            payload["request"] = request.clone();
        }
        let name = source
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TAB_NAME);
        payload["metadata"]["name"] = Value::String(format!("{CLONE_PREFIX}{name}"));
        payload
    }

    fn is_meaningful(&self, payload: &Value) -> bool {
        let non_empty = |pointer: &str| {
            payload
                .pointer(pointer)
                .and_then(Value::as_array)
                .is_some_and(|entries| !entries.is_empty())
        };
        non_empty("/request/production") || non_empty("/request/input")
    }
}
