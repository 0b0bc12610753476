//! HTTP client for the `/api/storage` endpoint.
//!
//! Wire contract:
//! - `GET  <base><endpoint>?key=<key>` returns the stored JSON, or literal `null`.
//! - `POST <base><endpoint>?key=<key>` with the JSON body; acknowledges with
//!   `{"success": true}` or an error payload.
//! - `DELETE <base><endpoint>?key=<key>` acknowledges like `POST`.

use crate::remote::{validate_key, RemoteError, RemoteResult, RemoteStore};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "/api/storage";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct StorageAck {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// `RemoteStore` backed by the storage HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
    endpoint: String,
    timeout: Duration,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the endpoint path, e.g. `/api/storage.php`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint = if endpoint.starts_with('/') {
            endpoint
        } else {
            format!("/{endpoint}")
        };
        self
    }

    /// Overrides the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }

    /// Deletes the blob stored under `key`; deleting a missing key succeeds.
    pub async fn delete(&self, key: &str) -> RemoteResult<()> {
        validate_key(key)?;
        let response = self
            .client
            .delete(self.url())
            .query(&[("key", key)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;
        expect_ack(key, "delete", response).await
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get(&self, key: &str) -> RemoteResult<Option<Value>> {
        validate_key(key)?;
        let response = self
            .client
            .get(self.url())
            .query(&[("key", key)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!("event=remote_get module=remote status=error key={key} http_status={status}");
            return Err(status_error(status, response).await);
        }

        let body = response.text().await.map_err(transport_error)?;
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            debug!("event=remote_get module=remote status=ok key={key} found=false");
            return Ok(None);
        }

        let value: Value = serde_json::from_str(trimmed)
            .map_err(|err| RemoteError::InvalidPayload(err.to_string()))?;
        debug!(
            "event=remote_get module=remote status=ok key={} found=true bytes={}",
            key,
            trimmed.len()
        );
        Ok((!value.is_null()).then_some(value))
    }

    async fn put(&self, key: &str, value: &Value) -> RemoteResult<()> {
        validate_key(key)?;
        let response = self
            .client
            .post(self.url())
            .query(&[("key", key)])
            .json(value)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;
        expect_ack(key, "put", response).await
    }
}

async fn expect_ack(key: &str, op: &str, response: Response) -> RemoteResult<()> {
    let status = response.status();
    if !status.is_success() {
        warn!("event=remote_{op} module=remote status=error key={key} http_status={status}");
        return Err(status_error(status, response).await);
    }

    let ack: StorageAck = response
        .json()
        .await
        .map_err(|err| RemoteError::Rejected(format!("unreadable acknowledgement: {err}")))?;
    if !ack.success {
        let details = ack
            .error
            .unwrap_or_else(|| "response did not carry a success marker".to_string());
        warn!("event=remote_{op} module=remote status=error key={key} error_code=remote_rejected");
        return Err(RemoteError::Rejected(details));
    }

    debug!("event=remote_{op} module=remote status=ok key={key}");
    Ok(())
}

async fn status_error(status: reqwest::StatusCode, response: Response) -> RemoteError {
    let details = match response.json::<StorageAck>().await {
        Ok(StorageAck {
            error: Some(message),
            ..
        }) => format!("HTTP {status}: {message}"),
        _ => format!("HTTP {status}"),
    };
    if status.is_server_error() {
        RemoteError::Unavailable(details)
    } else {
        RemoteError::Rejected(details)
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    RemoteError::Unavailable(err.to_string())
}
