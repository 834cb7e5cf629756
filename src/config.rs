//! Configuration System
//!
//! Layered configuration built with the `config` crate. Precedence, lowest first:
//! built-in defaults, the global file, the workspace `config/config.toml`, the
//! workspace `config/{HOTSYNC_ENV}.toml`, then `HOTSYNC__*` environment variables.

use crate::discovery::{DEFAULT_CONCURRENCY, RESOURCE_MANIFEST_PATH};
use crate::error::ApiError;
use crate::ignore::{IgnoreSet, DEFAULT_IGNORED_DIRS};
use crate::logging::LoggingConfig;
use crate::remote::DEFAULT_TIMEOUT;
use crate::updater::UpdateContext;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Default manifest service endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.1999.fan/api";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotsyncConfig {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Manifest service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Root of incremental detection
    #[serde(default = "default_root_manifest")]
    pub root_manifest: String,

    /// Root of a full resync
    #[serde(default = "default_resource_manifest")]
    pub resource_manifest: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_root_manifest() -> String {
    crate::cache::ROOT_MANIFEST_PATH.to_string()
}

fn default_resource_manifest() -> String {
    RESOURCE_MANIFEST_PATH.to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            root_manifest: default_root_manifest(),
            resource_manifest: default_resource_manifest(),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Local side of synchronization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Directory manifest paths resolve against (relative to the workspace)
    #[serde(default = "default_dest_root")]
    pub dest_root: PathBuf,

    /// Manifest timestamp cache (relative to the workspace)
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,

    /// Top-level directories that never hot-update
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,

    /// Simultaneous fetches during full discovery
    #[serde(default = "default_discovery_concurrency")]
    pub discovery_concurrency: usize,
}

fn default_dest_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_cache_file() -> PathBuf {
    PathBuf::from("config/manifest_cache.json")
}

fn default_ignored_dirs() -> Vec<String> {
    DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect()
}

fn default_discovery_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            dest_root: default_dest_root(),
            cache_file: default_cache_file(),
            ignored_dirs: default_ignored_dirs(),
            discovery_concurrency: default_discovery_concurrency(),
        }
    }
}

impl HotsyncConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let base = self.remote.api_base.trim();
        if base.is_empty() {
            errors.push("remote.api_base cannot be empty".to_string());
        } else if !(base.starts_with("http://") || base.starts_with("https://")) {
            errors.push(format!("remote.api_base must be an http(s) URL: {}", base));
        }
        if self.remote.timeout_secs == 0 {
            errors.push("remote.timeout_secs must be greater than zero".to_string());
        }
        if self.remote.root_manifest.trim().is_empty() {
            errors.push("remote.root_manifest cannot be empty".to_string());
        }
        if self.remote.resource_manifest.trim().is_empty() {
            errors.push("remote.resource_manifest cannot be empty".to_string());
        }
        if self.sync.cache_file.as_os_str().is_empty() {
            errors.push("sync.cache_file cannot be empty".to_string());
        }
        if self.sync.discovery_concurrency == 0 {
            errors.push("sync.discovery_concurrency must be greater than zero".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, mapping failures into a single [`ApiError`].
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            ))
        })?;
        Ok(self)
    }

    /// Build the pass context, resolving relative paths against `workspace_root`.
    pub fn update_context(&self, workspace_root: &Path) -> UpdateContext {
        let resolve = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                workspace_root.join(p)
            }
        };

        UpdateContext {
            root_manifest: self.remote.root_manifest.clone(),
            resource_manifest: self.remote.resource_manifest.clone(),
            dest_root: resolve(&self.sync.dest_root),
            cache_file: resolve(&self.sync.cache_file),
            ignored: IgnoreSet::new(self.sync.ignored_dirs.iter().cloned()),
            discovery_concurrency: self.sync.discovery_concurrency,
        }
    }
}
