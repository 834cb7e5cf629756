//! Integration tests for ManifestDiscovery

use super::test_utils::{standard_tree, FakeSource};
use hotsync::discovery::ManifestDiscovery;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_expand_lists_every_leaf_sorted() {
    let source = Arc::new(standard_tree());
    let leaves = ManifestDiscovery::new(source, 5)
        .expand("manifest.json")
        .await;

    assert_eq!(
        leaves,
        vec![
            "images/manifest.json",
            "resource/audio/manifest.json",
            "resource/ui/manifest.json",
        ]
    );
}

#[tokio::test]
async fn test_nested_images_directory_is_expanded() {
    let source = FakeSource::new();
    source.put_dir(
        "resource/manifest.json",
        1,
        &[("images", "resource/images/manifest.json"), ("ui", "resource/ui/manifest.json")],
    );
    source.put_leaf("resource/images/manifest.json", 1, &[("resource/images/a.png", b"a")]);
    source.put_leaf("resource/ui/manifest.json", 1, &[("resource/ui/b.png", b"b")]);

    let leaves = ManifestDiscovery::new(Arc::new(source), 5)
        .expand("resource/manifest.json")
        .await;
    assert_eq!(
        leaves,
        vec!["resource/images/manifest.json", "resource/ui/manifest.json"]
    );
}

#[tokio::test]
async fn test_expand_from_subtree_root() {
    let source = Arc::new(standard_tree());
    let leaves = ManifestDiscovery::new(source, 2)
        .expand("resource/manifest.json")
        .await;
    assert_eq!(leaves.len(), 2);
}

#[tokio::test]
async fn test_failed_branch_dropped() {
    let source = standard_tree();
    source.fail("resource/ui/manifest.json");
    let source = Arc::new(source);

    let leaves = ManifestDiscovery::new(source, 5)
        .expand("manifest.json")
        .await;
    assert_eq!(leaves, vec!["images/manifest.json", "resource/audio/manifest.json"]);
}

#[tokio::test]
async fn test_unreachable_root_yields_nothing() {
    let source = standard_tree();
    source.fail("manifest.json");
    let leaves = ManifestDiscovery::new(Arc::new(source), 5)
        .expand("manifest.json")
        .await;
    assert!(leaves.is_empty());
}

#[tokio::test]
async fn test_fetches_bounded_by_concurrency() {
    let source = FakeSource::new();
    let children: Vec<(String, String)> = (0..12)
        .map(|i| (format!("d{:02}", i), format!("d{:02}/manifest.json", i)))
        .collect();
    let refs: Vec<(&str, &str)> = children
        .iter()
        .map(|(n, m)| (n.as_str(), m.as_str()))
        .collect();
    source.put_dir("manifest.json", 1, &refs);
    for (name, manifest) in &children {
        let file = format!("{}/f.bin", name);
        source.put_leaf(manifest, 1, &[(file.as_str(), b"x")]);
    }
    source.set_delay(Duration::from_millis(20));
    let source = Arc::new(source);

    let leaves = ManifestDiscovery::new(source.clone(), 3)
        .expand("manifest.json")
        .await;

    assert_eq!(leaves.len(), 12);
    assert_eq!(leaves[0], "d00/manifest.json");
    assert!(source.max_in_flight() <= 3);
    assert!(source.max_in_flight() >= 2);
}

#[tokio::test]
async fn test_shared_child_fetched_once() {
    let source = FakeSource::new();
    source.put_dir(
        "manifest.json",
        1,
        &[("a", "shared/manifest.json"), ("b", "shared/manifest.json")],
    );
    source.put_leaf("shared/manifest.json", 1, &[("shared/f.txt", b"f")]);
    let source = Arc::new(source);

    let leaves = ManifestDiscovery::new(source.clone(), 5)
        .expand("manifest.json")
        .await;

    assert_eq!(leaves, vec!["shared/manifest.json"]);
    assert_eq!(source.manifest_requests().len(), 2);
}
