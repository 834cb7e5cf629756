//! Staleness detection
//!
//! Walks the remote manifest tree from the root and compares each node's `updated`
//! timestamp with the cache. A subtree is only descended into when its own
//! timestamp advanced, so an unchanged tree costs a single root request.
//!
//! Pruning relies on the service bumping every ancestor's timestamp when a
//! descendant changes. A leaf edited without that bump is invisible to this walk
//! until a full resync.

use crate::cache::CacheRecord;
use crate::ignore::IgnoreSet;
use crate::remote::ManifestSource;
use crate::types::{ManifestDocument, NodeFailure, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub needs_update: bool,
    /// Changed manifests that list files, in traversal order.
    pub updated_leaf_manifests: Vec<String>,
    /// Timestamps to persist if the pass is accepted.
    pub collected_timestamps: BTreeMap<String, Timestamp>,
    pub errors: Vec<NodeFailure>,
    /// The root timestamp matched the cache; nothing beyond the root was fetched.
    pub fast_path: bool,
    /// The root manifest itself could not be fetched.
    pub root_error: Option<String>,
    /// Manifest that first referenced each walked manifest.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parents: BTreeMap<String, String>,
}

impl DetectionResult {
    pub fn root_unreachable(&self) -> bool {
        self.root_error.is_some()
    }

    /// `path` followed by every manifest above it, nearest first.
    pub fn ancestry<'a>(&'a self, path: &'a str) -> Vec<&'a str> {
        let mut chain = vec![path];
        let mut current = path;
        while let Some(parent) = self.parents.get(current) {
            if chain.contains(&parent.as_str()) {
                break;
            }
            chain.push(parent.as_str());
            current = parent.as_str();
        }
        chain
    }
}

pub struct StalenessDetector {
    source: Arc<dyn ManifestSource>,
    ignored: IgnoreSet,
}

impl StalenessDetector {
    pub fn new(source: Arc<dyn ManifestSource>, ignored: IgnoreSet) -> Self {
        Self { source, ignored }
    }

    pub async fn detect(&self, root_path: &str, cache: &CacheRecord) -> DetectionResult {
        let mut result = DetectionResult::default();

        let root = match self.source.fetch_manifest(root_path).await {
            Ok(root) => root,
            Err(e) => {
                // Fail open: an unreachable service is never "nothing changed".
                warn!(path = root_path, error = %e, "Root manifest fetch failed");
                result.needs_update = true;
                result.root_error = Some(e.to_string());
                result.errors.push(NodeFailure::new(root_path, &e));
                return result;
            }
        };

        if root.updated_at == cache.root_updated_at && cache.root_updated_at > 0 {
            debug!(updated = root.updated_at, "Root manifest unchanged, skipping tree walk");
            result.fast_path = true;
            result.collected_timestamps = cache.manifest_timestamps.clone();
            result
                .collected_timestamps
                .insert(root_path.to_string(), root.updated_at);
            return result;
        }

        result
            .collected_timestamps
            .insert(root_path.to_string(), root.updated_at);

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(root_path.to_string());

        // Depth-first, children pushed in reverse so they pop in listed order.
        let mut stack: Vec<(String, String)> = Vec::new();
        self.push_children(&root, true, &mut stack);

        while let Some((path, parent)) = stack.pop() {
            if !visited.insert(path.clone()) {
                debug!(path = %path, "Manifest already visited in this pass");
                continue;
            }
            result.parents.insert(path.clone(), parent);

            let doc = match self.source.fetch_manifest(&path).await {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(path = %path, error = %e, "Manifest fetch failed, subtree skipped");
                    result.errors.push(NodeFailure::new(&path, &e));
                    continue;
                }
            };

            let remote = doc.updated_at;
            let local = cache.timestamp(&path);
            result.collected_timestamps.insert(path.clone(), remote);

            if remote > local {
                if doc.has_files() && !result.updated_leaf_manifests.contains(&path) {
                    debug!(path = %path, local, remote, "Manifest needs update");
                    result.updated_leaf_manifests.push(path.clone());
                }
                self.push_children(&doc, false, &mut stack);
            } else {
                debug!(path = %path, updated = remote, "Manifest unchanged");
                self.carry_forward(&doc, cache, &mut result.collected_timestamps);
            }
        }

        result.needs_update = !result.updated_leaf_manifests.is_empty();
        if result.needs_update {
            info!(
                count = result.updated_leaf_manifests.len(),
                "Detected manifests needing update"
            );
        } else {
            debug!("No manifests need update");
        }
        result
    }

    fn push_children(
        &self,
        doc: &ManifestDocument,
        top_level: bool,
        stack: &mut Vec<(String, String)>,
    ) {
        for dir in doc.directories.iter().rev() {
            if self.ignored.is_ignored(dir, top_level) {
                debug!(name = %dir.name, "Skipping ignored directory");
                continue;
            }
            stack.push((dir.manifest_path.clone(), doc.path.clone()));
        }
    }

    /// Keep cached timestamps for the descendants of an unchanged manifest.
    ///
    /// Direct children come from the document; deeper descendants are found by
    /// the manifest's directory prefix in the cache.
    fn carry_forward(
        &self,
        doc: &ManifestDocument,
        cache: &CacheRecord,
        collected: &mut BTreeMap<String, Timestamp>,
    ) {
        for dir in &doc.directories {
            if self.ignored.is_ignored(dir, false) {
                continue;
            }
            if let Some(ts) = cache.manifest_timestamps.get(&dir.manifest_path) {
                collected.entry(dir.manifest_path.clone()).or_insert(*ts);
            }
        }

        let Some(prefix) = directory_prefix(&doc.path) else {
            return;
        };
        for (path, ts) in &cache.manifest_timestamps {
            if path != &doc.path && path.starts_with(prefix) && !self.ignored.is_ignored_path(path)
            {
                collected.entry(path.clone()).or_insert(*ts);
            }
        }
    }
}

/// `"resource/ui/manifest.json"` -> `"resource/ui/"`; `None` for top-level paths.
fn directory_prefix(manifest_path: &str) -> Option<&str> {
    manifest_path
        .rfind('/')
        .map(|idx| &manifest_path[..=idx])
}
