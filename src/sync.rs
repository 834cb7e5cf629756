//! File synchronization
//!
//! Reconciles the files listed by leaf manifests against the local tree. A file is
//! downloaded only when it is missing or its SHA-256 differs from the manifest, and
//! downloaded bytes are written only after their hash matches the manifest. One
//! failing manifest or file never aborts the rest of the batch.

use crate::error::SyncError;
use crate::hash::ContentHash;
use crate::remote::ManifestSource;
use crate::types::FileEntry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub updated_files: Vec<String>,
    pub failed_files: Vec<String>,
    /// Manifests that could not be fetched or had at least one failed file.
    pub failed_manifests: Vec<String>,
    pub success: bool,
    /// Most recent failure message.
    pub error: Option<String>,
}

impl Default for SyncResult {
    fn default() -> Self {
        Self {
            updated_files: Vec::new(),
            failed_files: Vec::new(),
            failed_manifests: Vec::new(),
            success: true,
            error: None,
        }
    }
}

impl SyncResult {
    /// A result that failed before any manifest was processed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    fn record_failure(&mut self, message: String) {
        self.success = false;
        self.error = Some(message);
    }

    fn mark_manifest_failed(&mut self, manifest_path: &str) {
        if !self.failed_manifests.iter().any(|m| m == manifest_path) {
            self.failed_manifests.push(manifest_path.to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    UpToDate,
    Updated,
}

pub struct FileSynchronizer {
    source: Arc<dyn ManifestSource>,
    dest_root: PathBuf,
}

impl FileSynchronizer {
    pub fn new(source: Arc<dyn ManifestSource>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            source,
            dest_root: dest_root.into(),
        }
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Reconcile every file named by `leaf_manifest_paths`, in the given order.
    pub async fn sync(&self, leaf_manifest_paths: &[String]) -> SyncResult {
        let mut result = SyncResult::default();

        for manifest_path in leaf_manifest_paths {
            debug!(manifest = %manifest_path, "Syncing manifest");
            let doc = match self.source.fetch_manifest(manifest_path).await {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(manifest = %manifest_path, error = %e, "Manifest fetch failed");
                    result.record_failure(format!("Failed to update {}: {}", manifest_path, e));
                    result.mark_manifest_failed(manifest_path);
                    continue;
                }
            };

            for entry in &doc.files {
                match self.reconcile_file(entry).await {
                    Ok(FileOutcome::Updated) => {
                        result.updated_files.push(entry.relative_path.clone());
                    }
                    Ok(FileOutcome::UpToDate) => {}
                    Err(e) => {
                        warn!(file = %entry.relative_path, error = %e, "File update failed");
                        result.failed_files.push(entry.relative_path.clone());
                        result.record_failure(e.to_string());
                        result.mark_manifest_failed(manifest_path);
                    }
                }
            }
        }

        if result.updated_files.is_empty() {
            debug!("All files up to date");
        } else {
            info!(count = result.updated_files.len(), "Updated files");
        }
        if !result.failed_files.is_empty() || !result.failed_manifests.is_empty() {
            warn!(
                failed_files = result.failed_files.len(),
                failed_manifests = result.failed_manifests.len(),
                "Sync finished with failures"
            );
        }
        result
    }

    async fn reconcile_file(&self, entry: &FileEntry) -> Result<FileOutcome, SyncError> {
        let expected = entry.content_hash.ok_or_else(|| SyncError::InvalidHash {
            path: entry.relative_path.clone(),
            declared: entry.declared_hash.clone(),
        })?;
        let dest = resolve_destination(&self.dest_root, &entry.relative_path)?;

        if dest.exists() {
            let local = ContentHash::of_file(&dest).map_err(|e| SyncError::Filesystem {
                path: entry.relative_path.clone(),
                source: e,
            })?;
            if local == expected {
                debug!(file = %entry.relative_path, "File up to date");
                return Ok(FileOutcome::UpToDate);
            }
            debug!(
                file = %entry.relative_path,
                local = %local,
                remote = %expected,
                "File hash differs"
            );
        } else {
            debug!(file = %entry.relative_path, "File missing locally");
        }

        let bytes = self.source.fetch_file(&entry.relative_path).await?;
        let actual = ContentHash::of(&bytes);
        if actual != expected {
            return Err(SyncError::Integrity {
                path: entry.relative_path.clone(),
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            });
        }
        if bytes.len() as u64 != entry.size_bytes {
            debug!(
                file = %entry.relative_path,
                declared = entry.size_bytes,
                actual = bytes.len(),
                "Declared size differs from verified content"
            );
        }

        write_verified(&dest, &bytes).map_err(|e| SyncError::Filesystem {
            path: entry.relative_path.clone(),
            source: e,
        })?;
        Ok(FileOutcome::Updated)
    }
}

/// Join a manifest-relative path onto the destination root.
///
/// Only normal components are accepted, so a hostile manifest cannot write
/// outside the root.
pub fn resolve_destination(root: &Path, relative_path: &str) -> Result<PathBuf, SyncError> {
    let relative = Path::new(relative_path);
    let mut dest = root.to_path_buf();
    let mut parts = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                dest.push(part);
                parts += 1;
            }
            Component::CurDir => {}
            _ => return Err(SyncError::UnsafePath(relative_path.to_string())),
        }
    }
    if parts == 0 {
        return Err(SyncError::UnsafePath(relative_path.to_string()));
    }
    Ok(dest)
}

/// Write through a temporary sibling and rename, so an interrupted write never
/// leaves a truncated file in place.
fn write_verified(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut temp_name = dest.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".hotsync.tmp");
    let temp_path = dest.with_file_name(temp_name);

    fs::write(&temp_path, bytes)?;
    if let Err(e) = fs::rename(&temp_path, dest) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}
