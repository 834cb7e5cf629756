//! CLI output: rendered command results and error mapping.

use crate::error::ApiError;
use serde::Serialize;

/// Rendered output of one command and whether it should exit successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub success: bool,
}

impl CommandOutput {
    /// Pretty JSON rendering of a serializable result.
    pub fn json<T: Serialize>(value: &T, success: bool) -> Result<Self, ApiError> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render output: {}", e)))?;
        Ok(Self { text, success })
    }
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    e.to_string()
}
