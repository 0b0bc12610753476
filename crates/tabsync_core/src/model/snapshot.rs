//! Serialized workspace form shared by the local and remote tiers.
//!
//! The stored blob is a JSON array of tab payloads in display order.

use crate::model::tab::Tab;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The blob is valid JSON but not an array of payloads.
    NotAnArray(&'static str),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnArray(found) => {
                write!(f, "workspace snapshot must be an array, found {found}")
            }
        }
    }
}

impl Error for SnapshotError {}

/// Ordered tab payloads as persisted in either tier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkspaceSnapshot {
    payloads: Vec<Value>,
}

impl WorkspaceSnapshot {
    pub fn new(payloads: Vec<Value>) -> Self {
        Self { payloads }
    }

    pub fn from_tabs<'a>(tabs: impl IntoIterator<Item = &'a Tab>) -> Self {
        Self::new(tabs.into_iter().map(|tab| tab.payload().clone()).collect())
    }

    /// Parses a stored blob.
    pub fn from_json(value: Value) -> Result<Self, SnapshotError> {
        match value {
            Value::Array(payloads) => Ok(Self::new(payloads)),
            other => Err(SnapshotError::NotAnArray(json_kind(&other))),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.payloads.clone())
    }

    pub fn payloads(&self) -> &[Value] {
        &self.payloads
    }

    pub fn into_payloads(self) -> Vec<Value> {
        self.payloads
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
