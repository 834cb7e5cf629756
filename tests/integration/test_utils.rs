//! Shared test utilities for integration tests
//!
//! `FakeSource` is an in-memory manifest service: manifests and files live in
//! maps, every request is logged, and any path can be made to fail.

use async_trait::async_trait;
use hotsync::error::FetchError;
use hotsync::hash::ContentHash;
use hotsync::remote::ManifestSource;
use hotsync::types::{ManifestDocument, Timestamp};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct FakeSource {
    manifests: Mutex<HashMap<String, Value>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    requests: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every manifest request for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// A manifest with child directories only.
    pub fn put_dir(&self, path: &str, updated: Timestamp, children: &[(&str, &str)]) {
        let directories: Vec<Value> = children
            .iter()
            .map(|(name, manifest)| json!({ "name": name, "manifest": manifest }))
            .collect();
        self.manifests.lock().insert(
            path.to_string(),
            json!({ "updated": updated, "directories": directories }),
        );
    }

    /// A manifest listing files; the bytes are served as the file contents.
    pub fn put_leaf(&self, path: &str, updated: Timestamp, files: &[(&str, &[u8])]) {
        let entries: Vec<Value> = files.iter().map(|(p, c)| file_entry(p, c)).collect();
        self.manifests
            .lock()
            .insert(path.to_string(), json!({ "updated": updated, "files": entries }));
        let mut stored = self.files.lock();
        for (p, c) in files {
            stored.insert(p.to_string(), c.to_vec());
        }
    }

    pub fn put_raw_manifest(&self, path: &str, value: Value) {
        self.manifests.lock().insert(path.to_string(), value);
    }

    /// Serve `bytes` for `path` without touching the manifest that lists it.
    pub fn put_file(&self, path: &str, bytes: &[u8]) {
        self.files.lock().insert(path.to_string(), bytes.to_vec());
    }

    pub fn set_updated(&self, path: &str, updated: Timestamp) {
        if let Some(manifest) = self.manifests.lock().get_mut(path) {
            manifest["updated"] = json!(updated);
        }
    }

    pub fn fail(&self, path: &str) {
        self.failing.lock().insert(path.to_string());
    }

    pub fn heal(&self, path: &str) {
        self.failing.lock().remove(path);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn manifest_requests(&self) -> Vec<String> {
        self.requests_with_prefix("manifest:")
    }

    pub fn file_requests(&self) -> Vec<String> {
        self.requests_with_prefix("file:")
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn requests_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .filter_map(|r| r.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    fn check_failing(&self, path: &str) -> Result<(), FetchError> {
        if self.failing.lock().contains(path) {
            return Err(FetchError::Http {
                url: path.to_string(),
                status: 500,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ManifestSource for FakeSource {
    async fn fetch_manifest(&self, path: &str) -> Result<ManifestDocument, FetchError> {
        self.requests.lock().push(format!("manifest:{}", path));

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        self.check_failing(path)?;
        let body = self.manifests.lock().get(path).cloned().ok_or(FetchError::Http {
            url: path.to_string(),
            status: 404,
        })?;
        ManifestDocument::from_json(path, &serde_json::to_vec(&body).unwrap())
    }

    async fn fetch_file(&self, relative_path: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().push(format!("file:{}", relative_path));
        self.check_failing(relative_path)?;
        self.files
            .lock()
            .get(relative_path)
            .cloned()
            .ok_or(FetchError::Http {
                url: relative_path.to_string(),
                status: 404,
            })
    }
}

pub fn file_entry(path: &str, content: &[u8]) -> Value {
    let name = path.rsplit('/').next().unwrap_or(path);
    json!({
        "name": name,
        "path": path,
        "hash": ContentHash::of(content).to_hex(),
        "size": content.len(),
    })
}

/// The tree most tests start from:
///
/// ```text
/// manifest.json (100)
/// ├── resource/manifest.json (100)
/// │   ├── resource/ui/manifest.json (100)       resource/ui/a.png
/// │   └── resource/audio/manifest.json (50)     resource/audio/b.ogg
/// └── images/manifest.json (100)                images/c.png
/// ```
pub fn standard_tree() -> FakeSource {
    let source = FakeSource::new();
    source.put_dir(
        "manifest.json",
        100,
        &[("resource", "resource/manifest.json"), ("images", "images/manifest.json")],
    );
    source.put_dir(
        "resource/manifest.json",
        100,
        &[("ui", "resource/ui/manifest.json"), ("audio", "resource/audio/manifest.json")],
    );
    source.put_leaf("resource/ui/manifest.json", 100, &[("resource/ui/a.png", b"ui-bytes")]);
    source.put_leaf("resource/audio/manifest.json", 50, &[("resource/audio/b.ogg", b"ogg-bytes")]);
    source.put_leaf("images/manifest.json", 100, &[("images/c.png", b"image-bytes")]);
    source
}

/// Build a cache record from `(path, timestamp)` pairs; the root entry doubles as
/// `root_updated`.
pub fn cache_record(entries: &[(&str, Timestamp)]) -> hotsync::cache::CacheRecord {
    let manifest_timestamps: std::collections::BTreeMap<String, Timestamp> =
        entries.iter().map(|(p, t)| (p.to_string(), *t)).collect();
    hotsync::cache::CacheRecord {
        root_updated_at: manifest_timestamps.get("manifest.json").copied().unwrap_or(0),
        manifest_timestamps,
    }
}
