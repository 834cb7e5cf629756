//! Ignored directories.
//!
//! Some top-level directories of the remote tree never hot-update (large static
//! binaries). Names only match directories listed by the root manifest; below the
//! root a directory is ignored when its manifest path lives under an ignored name
//! (`images/...`), so a nested `resource/images` is still synced. Ignored
//! directories are never requested by the staleness walk.

use crate::types::DirectoryRef;
use std::collections::BTreeSet;

/// Built-in ignore entries.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &["images"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
    names: BTreeSet<String>,
}

impl IgnoreSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .map(|n: String| n.trim_matches('/').to_string())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `dir` is skipped. `top_level` is true for directories listed by
    /// the root manifest, the only place names are matched.
    pub fn is_ignored(&self, dir: &DirectoryRef, top_level: bool) -> bool {
        (top_level && self.names.contains(&dir.name)) || self.is_ignored_path(&dir.manifest_path)
    }

    /// Whether a manifest path sits under an ignored directory.
    pub fn is_ignored_path(&self, manifest_path: &str) -> bool {
        manifest_path
            .split('/')
            .next()
            .map(|first| first != manifest_path && self.names.contains(first))
            .unwrap_or(false)
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORED_DIRS.iter().copied())
    }
}
