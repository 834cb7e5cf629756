//! Manifest Discovery
//!
//! Cache-independent expansion of the whole manifest tree into its leaf manifests,
//! used for a forced full resync. Full expansion is bound by round-trip time times
//! tree depth, so directory fetches run on a bounded pool of tokio tasks.
//!
//! Tasks only fetch; the coordinating loop owns the leaf set and the worklist and
//! merges each task's result after it completes. Nothing is ignored here: a full
//! resync reaches every directory the tree lists.

use crate::error::FetchError;
use crate::remote::ManifestSource;
use crate::types::ManifestDocument;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default number of simultaneous manifest fetches.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Root of the full-resync tree.
pub const RESOURCE_MANIFEST_PATH: &str = "resource/manifest.json";

pub struct ManifestDiscovery {
    source: Arc<dyn ManifestSource>,
    concurrency: usize,
}

impl ManifestDiscovery {
    pub fn new(source: Arc<dyn ManifestSource>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    /// Expand `root_manifest_path` into all leaf manifest paths beneath it, sorted.
    ///
    /// A failed fetch drops that branch only. Returns once every spawned fetch has
    /// completed.
    pub async fn expand(&self, root_manifest_path: &str) -> Vec<String> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<(String, Result<ManifestDocument, FetchError>)> = JoinSet::new();
        let mut scheduled: HashSet<String> = HashSet::new();
        let mut leaves: BTreeSet<String> = BTreeSet::new();
        let mut failures = 0usize;

        scheduled.insert(root_manifest_path.to_string());
        self.spawn_fetch(&mut tasks, &semaphore, root_manifest_path.to_string());

        while let Some(joined) = tasks.join_next().await {
            let (path, fetched) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "Discovery task aborted");
                    failures += 1;
                    continue;
                }
            };

            let doc = match fetched {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(path = %path, error = %e, "Manifest fetch failed during discovery");
                    failures += 1;
                    continue;
                }
            };

            if !doc.directories.is_empty() {
                for dir in &doc.directories {
                    if scheduled.insert(dir.manifest_path.clone()) {
                        self.spawn_fetch(&mut tasks, &semaphore, dir.manifest_path.clone());
                    } else {
                        debug!(path = %dir.manifest_path, "Manifest already scheduled");
                    }
                }
            } else if doc.has_files() {
                leaves.insert(doc.path);
            }
        }

        info!(
            leaves = leaves.len(),
            fetched = scheduled.len(),
            failures,
            "Manifest discovery finished"
        );
        leaves.into_iter().collect()
    }

    fn spawn_fetch(
        &self,
        tasks: &mut JoinSet<(String, Result<ManifestDocument, FetchError>)>,
        semaphore: &Arc<Semaphore>,
        path: String,
    ) {
        let source = Arc::clone(&self.source);
        let semaphore = Arc::clone(semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let fetched = source.fetch_manifest(&path).await;
            (path, fetched)
        });
    }
}
