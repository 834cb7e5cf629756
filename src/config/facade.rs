//! Config loading facade: assembles sources in precedence order.

use super::merge::merge_policy;
use super::sources::{env, global_file, workspace_file};
use super::HotsyncConfig;
use crate::error::ApiError;
use config::File;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (highest first): environment, workspace env file, workspace
    /// base file, global file, defaults.
    pub fn load(workspace_root: &Path) -> Result<HotsyncConfig, ApiError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = env::add_to_builder(builder);

        let config: HotsyncConfig = builder.build()?.try_deserialize()?;
        config.validated()
    }

    /// Load configuration from one explicit file plus environment overrides.
    pub fn load_from_file(path: &Path) -> Result<HotsyncConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true));
        let builder = env::add_to_builder(builder);

        let config: HotsyncConfig = builder.build()?.try_deserialize()?;
        config.validated()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
