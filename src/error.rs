//! Error types for the hotsync asset synchronization system.

use thiserror::Error;

/// Failures of a single request against the manifest service.
///
/// Carries rendered messages rather than the transport error so results can be
/// cloned into per-node failure records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("Invalid manifest {path}: {message}")]
    Parse { path: String, message: String },
}

/// Failures while reconciling a single file against its manifest entry.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Hash mismatch for {path}: expected {expected}, got {actual}")]
    Integrity {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Filesystem error at {path}: {source}")]
    Filesystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid content hash for {path}: {declared:?}")]
    InvalidHash { path: String, declared: String },

    #[error("Refusing path outside destination root: {0}")]
    UnsafePath(String),
}

/// Manifest cache persistence errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Setup errors: configuration, logging, client construction.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging setup failed: {0}")]
    LoggingError(String),

    #[error("HTTP client error: {0}")]
    ClientError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
