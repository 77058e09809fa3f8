//! Change detection - combines page snapshots into one canonical text,
//! fingerprints it, and compares against the previously stored digest.

use crate::types::Snapshot;

/// Separator between per-URL sections in the combined content.
pub const SNAPSHOT_SEPARATOR: &str = "\n\n---\n\n";

/// Combine snapshots into the canonical text that gets fingerprinted.
///
/// Snapshot order is the job's URL column order, so the result is a pure
/// function of content + URL ordering.
pub fn combine_snapshots(snapshots: &[Snapshot]) -> String {
    snapshots
        .iter()
        .map(|s| format!("URL: {}\n{}", s.url, s.text))
        .collect::<Vec<_>>()
        .join(SNAPSHOT_SEPARATOR)
}

/// Hex digest of the combined content.
///
/// md5 here is a change-detection fingerprint, not an integrity check.
pub fn content_digest(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

/// Result of comparing fresh content against the stored digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeDetection {
    Unchanged { digest: String },
    Changed { digest: String },
}

pub fn detect_change(combined: &str, previous_digest: Option<&str>) -> ChangeDetection {
    let digest = content_digest(combined);
    match previous_digest {
        Some(previous) if previous == digest => ChangeDetection::Unchanged { digest },
        _ => ChangeDetection::Changed { digest },
    }
}
