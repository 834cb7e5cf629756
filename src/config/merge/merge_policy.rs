//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Defaults mirror the serde defaults so a partially written file still merges
/// onto a complete configuration.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("remote.api_base", crate::config::DEFAULT_API_BASE)?
        .set_default("remote.timeout_secs", 5)?
        .set_default("remote.root_manifest", "manifest.json")?
        .set_default("remote.resource_manifest", "resource/manifest.json")?
        .set_default("sync.dest_root", ".")?
        .set_default("sync.cache_file", "config/manifest_cache.json")?
        .set_default("sync.ignored_dirs", vec!["images"])?
        .set_default("sync.discovery_concurrency", 5)
}
