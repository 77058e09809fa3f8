//! Unit tests for content fingerprinting and change detection.

use spyglass_core::detector::{
    combine_snapshots, content_digest, detect_change, ChangeDetection, SNAPSHOT_SEPARATOR,
};
use spyglass_core::types::Snapshot;

fn snapshot(url: &str, text: &str) -> Snapshot {
    Snapshot {
        url: url.to_string(),
        text: text.to_string(),
    }
}

#[test]
fn identical_content_produces_same_digest() {
    let text = "Product X price $10";
    assert_eq!(content_digest(text), content_digest(text));
}

#[test]
fn digest_is_stable_across_invocations() {
    // Pinned value: a changed digest algorithm would invalidate every stored
    // hash and re-trigger analysis for all jobs on deploy.
    assert_eq!(
        content_digest("Product X price $10"),
        "5553409234bdf725f1b9f709f931a38e"
    );
}

#[test]
fn single_byte_difference_changes_the_digest() {
    assert_ne!(
        content_digest("Product X price $10"),
        content_digest("Product X price $11")
    );
}

#[test]
fn digest_format_is_md5_hex() {
    let digest = content_digest("anything");
    assert_eq!(digest.len(), 32);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn snapshot_order_is_part_of_the_content() {
    let forward = combine_snapshots(&[
        snapshot("https://a.com", "alpha"),
        snapshot("https://b.com", "beta"),
    ]);
    let reversed = combine_snapshots(&[
        snapshot("https://b.com", "beta"),
        snapshot("https://a.com", "alpha"),
    ]);
    assert_ne!(content_digest(&forward), content_digest(&reversed));
}

#[test]
fn url_is_part_of_the_content() {
    let one = combine_snapshots(&[snapshot("https://a.com", "same text")]);
    let other = combine_snapshots(&[snapshot("https://b.com", "same text")]);
    assert_ne!(content_digest(&one), content_digest(&other));
}

#[test]
fn combined_sections_use_the_fixed_separator() {
    let combined = combine_snapshots(&[
        snapshot("https://a.com", "alpha"),
        snapshot("https://b.com", "beta"),
    ]);
    assert_eq!(combined.matches(SNAPSHOT_SEPARATOR).count(), 1);
    assert!(combined.starts_with("URL: https://a.com\nalpha"));
    assert!(combined.ends_with("URL: https://b.com\nbeta"));
}

#[test]
fn detection_against_matching_digest_is_unchanged() {
    let combined = combine_snapshots(&[snapshot("https://a.com", "alpha")]);
    let digest = content_digest(&combined);

    assert!(matches!(
        detect_change(&combined, Some(&digest)),
        ChangeDetection::Unchanged { .. }
    ));
    assert!(matches!(
        detect_change(&combined, Some("0123456789abcdef0123456789abcdef")),
        ChangeDetection::Changed { .. }
    ));
    assert!(matches!(
        detect_change(&combined, None),
        ChangeDetection::Changed { .. }
    ));
}
