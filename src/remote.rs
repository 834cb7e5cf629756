//! Remote Manifest Client
//!
//! Request/response access to the manifest service: one manifest document or one
//! file's bytes per call. Every call is bounded by a fixed short timeout and is
//! never retried here; callers decide what a failure means for their pass.

use crate::error::{ApiError, FetchError};
use crate::types::ManifestDocument;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of manifests and file contents.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetch and validate the manifest at `path` (relative to the API base).
    async fn fetch_manifest(&self, path: &str) -> Result<ManifestDocument, FetchError>;

    /// Fetch the raw bytes of the file at `relative_path`.
    async fn fetch_file(&self, relative_path: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP implementation of [`ManifestSource`].
#[derive(Debug, Clone)]
pub struct HttpManifestClient {
    client: Client,
    api_base: String,
}

impl HttpManifestClient {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        // The service is reached directly; system proxies only slow it down.
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ClientError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.into(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// `<api_base>/<path>` with exactly one separating slash.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url_for(path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_http_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_http_error(&url, e))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ManifestSource for HttpManifestClient {
    async fn fetch_manifest(&self, path: &str) -> Result<ManifestDocument, FetchError> {
        let body = self.get_bytes(path).await?;
        ManifestDocument::from_json(path, &body)
    }

    async fn fetch_file(&self, relative_path: &str) -> Result<Vec<u8>, FetchError> {
        self.get_bytes(relative_path).await
    }
}

fn map_http_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if let Some(status) = error.status() {
        FetchError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: format!("Connection error: {}", error),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
