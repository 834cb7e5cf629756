//! Integration tests for CLI command routing

use super::test_utils::standard_tree;
use hotsync::cli::{Commands, RunContext};
use hotsync::config::HotsyncConfig;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

fn context(workspace: &TempDir) -> RunContext {
    RunContext::with_source(
        workspace.path().to_path_buf(),
        HotsyncConfig::default(),
        Arc::new(standard_tree()),
    )
}

#[tokio::test]
async fn test_check_reports_detection() {
    let workspace = TempDir::new().unwrap();
    let output = context(&workspace).execute(&Commands::Check).await.unwrap();

    assert!(output.success);
    let value: Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(value["needs_update"], true);
    assert_eq!(value["updated_leaf_manifests"][0], "resource/ui/manifest.json");
    assert!(!workspace.path().join("config/manifest_cache.json").exists());
}

#[tokio::test]
async fn test_sync_writes_into_workspace() {
    let workspace = TempDir::new().unwrap();
    let ctx = context(&workspace);

    let output = ctx.execute(&Commands::Sync { full: false }).await.unwrap();

    assert!(output.success);
    let value: Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(value["mode"], "incremental");
    assert_eq!(value["cache_saved"], true);
    assert!(workspace.path().join("resource/ui/a.png").exists());
    assert!(workspace.path().join("config/manifest_cache.json").exists());
}

#[tokio::test]
async fn test_full_sync_mode() {
    let workspace = TempDir::new().unwrap();
    let output = context(&workspace)
        .execute(&Commands::Sync { full: true })
        .await
        .unwrap();

    let value: Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(value["mode"], "full");
    assert_eq!(value["cache_saved"], false);
}

#[tokio::test]
async fn test_expand_defaults_to_resource_root() {
    let workspace = TempDir::new().unwrap();
    let output = context(&workspace)
        .execute(&Commands::Expand { root: None })
        .await
        .unwrap();

    assert!(output.success);
    let value: Value = serde_json::from_str(&output.text).unwrap();
    assert_eq!(value["root"], "resource/manifest.json");
    assert_eq!(value["leaf_manifests"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_expand_unknown_root_is_unsuccessful() {
    let workspace = TempDir::new().unwrap();
    let output = context(&workspace)
        .execute(&Commands::Expand {
            root: Some("missing/manifest.json".to_string()),
        })
        .await
        .unwrap();
    assert!(!output.success);
}
