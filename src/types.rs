//! Manifest data model
//!
//! Wire payloads from the manifest service are deserialized into private `Wire*`
//! structs and immediately validated into the strongly-typed model below. The
//! detector and synchronizer only ever see `ManifestDocument`.

use crate::error::FetchError;
use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Update timestamp as published by the manifest service.
pub type Timestamp = i64;

/// One node of the remote manifest tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDocument {
    pub path: String,
    pub updated_at: Timestamp,
    pub files: Vec<FileEntry>,
    pub directories: Vec<DirectoryRef>,
}

/// A file listed by a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    /// Both the download path under the API base and the destination path
    /// under the local root.
    pub relative_path: String,
    /// `None` when the published digest is not 64 hex characters; the file then
    /// fails on its own during sync instead of failing the whole manifest.
    pub content_hash: Option<ContentHash>,
    /// Digest string exactly as published.
    pub declared_hash: String,
    pub size_bytes: u64,
}

/// Reference from a manifest to a child manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRef {
    pub name: String,
    pub manifest_path: String,
}

impl ManifestDocument {
    /// Files and no child directories.
    pub fn is_leaf(&self) -> bool {
        !self.files.is_empty() && self.directories.is_empty()
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Parse and validate a manifest body fetched from `path`.
    pub fn from_json(path: &str, body: &[u8]) -> Result<Self, FetchError> {
        let wire: WireManifest = serde_json::from_slice(body).map_err(|e| FetchError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_wire(path, wire)
    }

    fn from_wire(path: &str, wire: WireManifest) -> Result<Self, FetchError> {
        let parse_error = |message: String| FetchError::Parse {
            path: path.to_string(),
            message,
        };

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for entry in wire.files.unwrap_or_default() {
            if entry.path.is_empty() {
                return Err(parse_error(format!("file '{}' has an empty path", entry.name)));
            }
            if !seen.insert(entry.path.clone()) {
                return Err(parse_error(format!("duplicate file path '{}'", entry.path)));
            }
            let content_hash = ContentHash::from_hex(&entry.hash).ok();
            files.push(FileEntry {
                name: entry.name,
                relative_path: entry.path,
                content_hash,
                declared_hash: entry.hash,
                size_bytes: entry.size,
            });
        }

        let directories = wire
            .directories
            .unwrap_or_default()
            .into_iter()
            .filter(|d| !d.manifest.is_empty())
            .map(|d| DirectoryRef {
                name: d.name,
                manifest_path: d.manifest,
            })
            .collect();

        Ok(Self {
            path: path.to_string(),
            updated_at: wire.updated,
            files,
            directories,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireManifest {
    #[serde(default)]
    updated: Timestamp,
    #[serde(default)]
    files: Option<Vec<WireFileEntry>>,
    #[serde(default)]
    directories: Option<Vec<WireDirectoryRef>>,
}

#[derive(Debug, Deserialize)]
struct WireFileEntry {
    #[serde(default)]
    name: String,
    path: String,
    #[serde(default)]
    hash: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct WireDirectoryRef {
    name: String,
    #[serde(default)]
    manifest: String,
}

/// A per-node failure recorded during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFailure {
    pub path: String,
    pub error: String,
}

impl NodeFailure {
    pub fn new(path: impl Into<String>, error: impl ToString) -> Self {
        Self {
            path: path.into(),
            error: error.to_string(),
        }
    }
}
