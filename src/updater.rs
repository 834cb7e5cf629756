//! Update passes
//!
//! Wires the components into the two control flows a caller can choose:
//!
//! - incremental: cache load → staleness detection → file sync → cache save
//! - full: manifest discovery → file sync
//!
//! Everything a pass needs travels in an explicit [`UpdateContext`]; nothing is
//! held in process-wide state between passes. Neither flow returns an error: the
//! [`UpdateReport`] says what happened and the caller decides whether to proceed.

use crate::cache::{ManifestCache, ROOT_MANIFEST_PATH};
use crate::detect::{DetectionResult, StalenessDetector};
use crate::discovery::{ManifestDiscovery, DEFAULT_CONCURRENCY, RESOURCE_MANIFEST_PATH};
use crate::ignore::IgnoreSet;
use crate::remote::ManifestSource;
use crate::sync::{FileSynchronizer, SyncResult};
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Per-pass settings supplied by the caller.
#[derive(Debug, Clone)]
pub struct UpdateContext {
    /// Root of the incremental detection walk.
    pub root_manifest: String,
    /// Root of a full resync.
    pub resource_manifest: String,
    /// Local directory that manifest-relative paths resolve against.
    pub dest_root: PathBuf,
    pub cache_file: PathBuf,
    pub ignored: IgnoreSet,
    pub discovery_concurrency: usize,
}

impl UpdateContext {
    pub fn new(dest_root: impl Into<PathBuf>, cache_file: impl Into<PathBuf>) -> Self {
        Self {
            root_manifest: ROOT_MANIFEST_PATH.to_string(),
            resource_manifest: RESOURCE_MANIFEST_PATH.to_string(),
            dest_root: dest_root.into(),
            cache_file: cache_file.into(),
            ignored: IgnoreSet::default(),
            discovery_concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    Incremental,
    Full,
    /// Incremental pass that fell back to a full resync because the root
    /// manifest was unreachable.
    FullFallback,
}

/// Everything one pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub mode: UpdateMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovered_manifests: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncResult>,
    pub cache_saved: bool,
}

impl UpdateReport {
    /// No sync failures and no detection errors.
    pub fn success(&self) -> bool {
        let sync_ok = self.sync.as_ref().map(|s| s.success).unwrap_or(true);
        let detection_ok = self
            .detection
            .as_ref()
            .map(|d| d.errors.is_empty())
            .unwrap_or(true);
        sync_ok && detection_ok
    }

    pub fn updated_files(&self) -> &[String] {
        self.sync
            .as_ref()
            .map(|s| s.updated_files.as_slice())
            .unwrap_or(&[])
    }
}

pub struct ResourceUpdater {
    source: Arc<dyn ManifestSource>,
    context: UpdateContext,
}

impl ResourceUpdater {
    pub fn new(source: Arc<dyn ManifestSource>, context: UpdateContext) -> Self {
        Self { source, context }
    }

    pub fn context(&self) -> &UpdateContext {
        &self.context
    }

    fn cache(&self) -> ManifestCache {
        ManifestCache::with_root(&self.context.cache_file, &self.context.root_manifest)
    }

    /// Detection only; reads the cache, writes nothing.
    pub async fn check(&self) -> DetectionResult {
        let record = self.cache().load();
        StalenessDetector::new(Arc::clone(&self.source), self.context.ignored.clone())
            .detect(&self.context.root_manifest, &record)
            .await
    }

    /// Cache-guided pass touching only manifests whose timestamps advanced.
    pub async fn run_incremental(&self) -> UpdateReport {
        let cache = self.cache();
        let record = cache.load();
        let detection =
            StalenessDetector::new(Arc::clone(&self.source), self.context.ignored.clone())
                .detect(&self.context.root_manifest, &record)
                .await;

        if detection.root_unreachable() {
            warn!("Root manifest unreachable, falling back to full resync");
            let mut report = self.run_full().await;
            report.mode = UpdateMode::FullFallback;
            report.detection = Some(detection);
            return report;
        }

        if detection.fast_path {
            return UpdateReport {
                mode: UpdateMode::Incremental,
                detection: Some(detection),
                discovered_manifests: None,
                sync: None,
                cache_saved: false,
            };
        }

        let sync = if detection.needs_update {
            Some(
                FileSynchronizer::new(Arc::clone(&self.source), &self.context.dest_root)
                    .sync(&detection.updated_leaf_manifests)
                    .await,
            )
        } else {
            None
        };

        let persist = timestamps_to_persist(&detection, sync.as_ref(), &self.context.root_manifest);
        let cache_saved = match cache.save(&persist) {
            Ok(_) => true,
            Err(e) => {
                warn!(path = %cache.path().display(), error = %e, "Failed to save manifest cache");
                false
            }
        };

        let report = UpdateReport {
            mode: UpdateMode::Incremental,
            detection: Some(detection),
            discovered_manifests: None,
            sync,
            cache_saved,
        };
        info!(
            updated = report.updated_files().len(),
            success = report.success(),
            "Incremental update finished"
        );
        report
    }

    /// All leaf manifests under `root`, without consulting the cache.
    pub async fn expand(&self, root: &str) -> Vec<String> {
        ManifestDiscovery::new(Arc::clone(&self.source), self.context.discovery_concurrency)
            .expand(root)
            .await
    }

    /// Cache-independent pass over every leaf manifest under the resource root.
    pub async fn run_full(&self) -> UpdateReport {
        let discovered = self.expand(&self.context.resource_manifest).await;

        let sync = if discovered.is_empty() {
            warn!(root = %self.context.resource_manifest, "No leaf manifests discovered");
            SyncResult::failed("no leaf manifests discovered")
        } else {
            FileSynchronizer::new(Arc::clone(&self.source), &self.context.dest_root)
                .sync(&discovered)
                .await
        };

        let report = UpdateReport {
            mode: UpdateMode::Full,
            detection: None,
            discovered_manifests: Some(discovered),
            sync: Some(sync),
            cache_saved: false,
        };
        info!(
            updated = report.updated_files().len(),
            success = report.success(),
            "Full resync finished"
        );
        report
    }
}

/// Timestamps to persist after an incremental pass.
///
/// A failed manifest is dropped together with every manifest above it, so the
/// next pass reads that whole chain as changed and walks back down to retry it.
/// The root entry is dropped on any failure, which also rules out the fast path.
pub fn timestamps_to_persist(
    detection: &DetectionResult,
    sync: Option<&SyncResult>,
    root_path: &str,
) -> BTreeMap<String, Timestamp> {
    let mut persist = detection.collected_timestamps.clone();
    let mut any_failure = !detection.errors.is_empty();

    let mut failed: Vec<&str> = detection.errors.iter().map(|e| e.path.as_str()).collect();
    if let Some(sync) = sync {
        failed.extend(sync.failed_manifests.iter().map(String::as_str));
        any_failure |= !sync.success;
    }

    for manifest in failed {
        for path in detection.ancestry(manifest) {
            persist.remove(path);
        }
    }

    if any_failure {
        persist.remove(root_path);
    }
    persist
}
