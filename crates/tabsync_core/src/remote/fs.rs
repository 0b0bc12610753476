//! Filesystem blob store mirroring the storage endpoint's on-disk layout.
//!
//! Each key maps to `<dir>/<key>.json`; the blob is stored verbatim.

use crate::remote::{validate_key, RemoteError, RemoteResult, RemoteStore};
use async_trait::async_trait;
use log::{debug, error};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// `RemoteStore` writing one JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FsRemoteStore {
    dir: PathBuf,
}

impl FsRemoteStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> RemoteResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Deletes the blob for `key`; a missing blob is not an error.
    pub async fn delete(&self, key: &str) -> RemoteResult<()> {
        let path = self.blob_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => {
                error!("event=remote_delete module=remote status=error key={key} error={err}");
                Err(RemoteError::Unavailable(format!("failed to delete data: {err}")))
            }
        }
    }
}

#[async_trait]
impl RemoteStore for FsRemoteStore {
    async fn get(&self, key: &str) -> RemoteResult<Option<Value>> {
        let path = self.blob_path(key)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("event=remote_get module=remote status=ok key={key} found=false");
                return Ok(None);
            }
            Err(err) => {
                error!("event=remote_get module=remote status=error key={key} error={err}");
                return Err(RemoteError::Unavailable(err.to_string()));
            }
        };

        let value: Value = serde_json::from_str(&raw)
            .map_err(|err| RemoteError::InvalidPayload(err.to_string()))?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn put(&self, key: &str, value: &Value) -> RemoteResult<()> {
        let path = self.blob_path(key)?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(|err| {
            error!(
                "event=remote_put module=remote status=error key={} error_code=create_dir_failed error={}",
                key, err
            );
            RemoteError::Unavailable(format!("failed to create storage directory: {err}"))
        })?;

        let encoded = value.to_string();
        tokio::fs::write(&path, encoded.as_bytes())
            .await
            .map_err(|err| {
                error!("event=remote_put module=remote status=error key={key} error={err}");
                RemoteError::Unavailable(format!("failed to save data: {err}"))
            })?;
        debug!(
            "event=remote_put module=remote status=ok key={} bytes={}",
            key,
            encoded.len()
        );
        Ok(())
    }
}
