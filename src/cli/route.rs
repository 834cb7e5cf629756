//! CLI route: single route table and run context.

use crate::cli::output::CommandOutput;
use crate::cli::parse::Commands;
use crate::config::{ConfigLoader, HotsyncConfig};
use crate::error::ApiError;
use crate::remote::{HttpManifestClient, ManifestSource};
use crate::updater::ResourceUpdater;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Runtime context for CLI execution: workspace, loaded config and the updater.
pub struct RunContext {
    workspace_root: PathBuf,
    config: HotsyncConfig,
    updater: ResourceUpdater,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };

        let client = HttpManifestClient::new(config.remote.api_base.clone(), config.remote.timeout())?;
        Ok(Self::with_source(workspace_root, config, Arc::new(client)))
    }

    /// Run context over an arbitrary manifest source.
    pub fn with_source(
        workspace_root: PathBuf,
        config: HotsyncConfig,
        source: Arc<dyn ManifestSource>,
    ) -> Self {
        let context = config.update_context(&workspace_root);
        Self {
            workspace_root,
            config,
            updater: ResourceUpdater::new(source, context),
        }
    }

    pub fn workspace_root(&self) -> &PathBuf {
        &self.workspace_root
    }

    pub fn config(&self) -> &HotsyncConfig {
        &self.config
    }

    /// Execute a command. Sync failures are reported through
    /// [`CommandOutput::success`], not as errors.
    pub async fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Check => {
                let detection = self.updater.check().await;
                let ok = detection.errors.is_empty();
                CommandOutput::json(&detection, ok)
            }
            Commands::Sync { full } => {
                let report = if *full {
                    self.updater.run_full().await
                } else {
                    self.updater.run_incremental().await
                };
                info!(success = report.success(), "Sync command finished");
                CommandOutput::json(&report, report.success())
            }
            Commands::Expand { root } => {
                let root = root
                    .clone()
                    .unwrap_or_else(|| self.updater.context().resource_manifest.clone());
                let leaves = self.updater.expand(&root).await;
                let ok = !leaves.is_empty();
                CommandOutput::json(&json!({ "root": root, "leaf_manifests": leaves }), ok)
            }
        }
    }
}
