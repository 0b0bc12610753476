//! Remote key-value tier.
//!
//! # Responsibility
//! - Define the asynchronous `get`/`put` contract the coordinator consumes.
//! - Classify remote failures so callers can decide between fallback and drop.
//!
//! # Invariants
//! - `get` of a never-written key resolves to `Ok(None)`, not an error.
//! - A JSON `null` blob is indistinguishable from an absent key.
//! - Implementations must eventually resolve; the coordinator adds no timeout.

mod fs;
mod http;

pub use fs::FsRemoteStore;
pub use http::HttpRemoteStore;

use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure taxonomy for remote storage calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport failure, timeout or server fault.
    Unavailable(String),
    /// Server answered without the success marker.
    Rejected(String),
    /// Key is empty or cannot be addressed by the store.
    InvalidKey(String),
    /// Stored blob is not valid JSON.
    InvalidPayload(String),
}

impl RemoteError {
    /// Whether a later attempt may succeed without any change on our side.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Rejected(_))
    }

    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "remote_unavailable",
            Self::Rejected(_) => "remote_rejected",
            Self::InvalidKey(_) => "invalid_key",
            Self::InvalidPayload(_) => "invalid_payload",
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(details) => write!(f, "remote storage unavailable: {details}"),
            Self::Rejected(details) => write!(f, "remote storage rejected request: {details}"),
            Self::InvalidKey(key) => write!(f, "invalid storage key: `{key}`"),
            Self::InvalidPayload(details) => write!(f, "invalid stored payload: {details}"),
        }
    }
}

impl Error for RemoteError {}

/// Asynchronous key -> JSON store acting as the remote authority.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the blob stored under `key`; `Ok(None)` when absent.
    async fn get(&self, key: &str) -> RemoteResult<Option<Value>>;

    /// Replaces the blob stored under `key`.
    async fn put(&self, key: &str, value: &Value) -> RemoteResult<()>;
}

/// Rejects keys that cannot be mapped onto a single blob.
pub(crate) fn validate_key(key: &str) -> RemoteResult<()> {
    let trimmed = key.trim();
    if trimmed.is_empty()
        || trimmed != key
        || key.contains(['/', '\\'])
        || key.contains("..")
    {
        return Err(RemoteError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_key, RemoteError};

    #[test]
    fn validate_key_accepts_storage_keys() {
        assert!(validate_key("production1").is_ok());
        assert!(validate_key("production-ficsmas").is_ok());
    }

    #[test]
    fn validate_key_rejects_blank_and_path_like_keys() {
        for key in ["", "  ", "../etc", "a/b", "a\\b", " padded"] {
            assert!(
                matches!(validate_key(key), Err(RemoteError::InvalidKey(_))),
                "key `{key}` should be rejected"
            );
        }
    }

    #[test]
    fn only_transport_and_rejection_are_transient() {
        assert!(RemoteError::Unavailable("timeout".into()).is_transient());
        assert!(RemoteError::Rejected("no success".into()).is_transient());
        assert!(!RemoteError::InvalidKey(String::new()).is_transient());
        assert!(!RemoteError::InvalidPayload("x".into()).is_transient());
    }
}
