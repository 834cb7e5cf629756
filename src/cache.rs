//! Manifest timestamp cache
//!
//! A single JSON file remembering the last seen `updated` value of every manifest.
//! It is read once per pass and replaced wholesale at most once, so any path left
//! out of a save is forgotten and will be re-checked on the next pass.

use crate::error::CacheError;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Path of the root manifest relative to the API base.
pub const ROOT_MANIFEST_PATH: &str = "manifest.json";

/// Persisted cache contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    #[serde(rename = "root_updated")]
    pub root_updated_at: Timestamp,
    #[serde(rename = "manifests")]
    pub manifest_timestamps: BTreeMap<String, Timestamp>,
}

impl CacheRecord {
    /// Cached timestamp for `path`; absent paths read as 0.
    pub fn timestamp(&self, path: &str) -> Timestamp {
        self.manifest_timestamps.get(path).copied().unwrap_or(0)
    }
}

/// File-backed store for a [`CacheRecord`].
#[derive(Debug, Clone)]
pub struct ManifestCache {
    path: PathBuf,
    root_path: String,
}

impl ManifestCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_root(path, ROOT_MANIFEST_PATH)
    }

    /// Cache whose root timestamp is read from `root_path`'s entry on save.
    pub fn with_root(path: impl Into<PathBuf>, root_path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            root_path: root_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, downgrading every failure to the empty default.
    pub fn load(&self) -> CacheRecord {
        match self.try_load() {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable manifest cache");
                CacheRecord::default()
            }
        }
    }

    /// Strict load. A missing file is not an error and yields the empty record.
    pub fn try_load(&self) -> Result<CacheRecord, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No manifest cache yet");
                return Ok(CacheRecord::default());
            }
            Err(e) => return Err(CacheError::Io(e)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Replace the persisted record with one built from `collected`.
    ///
    /// Writes to a temporary sibling and renames it into place, so readers see
    /// either the old record or the new one.
    pub fn save(&self, collected: &BTreeMap<String, Timestamp>) -> Result<CacheRecord, CacheError> {
        let record = CacheRecord {
            root_updated_at: collected.get(&self.root_path).copied().unwrap_or(0),
            manifest_timestamps: collected.clone(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let serialized = serde_json::to_vec_pretty(&record)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &serialized)?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::Io(e));
        }

        debug!(
            path = %self.path.display(),
            manifests = record.manifest_timestamps.len(),
            "Manifest cache saved"
        );
        Ok(record)
    }
}
