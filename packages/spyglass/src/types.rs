use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user's monitoring job: up to three target URLs plus the last-known
/// state of the previous check.
///
/// Mutated by the cycle runner (hash/report/timestamp) and by webhook intake
/// (creation/activation); never deleted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringJob {
    pub user_email: String,
    #[serde(default)]
    pub url_1: Option<String>,
    #[serde(default)]
    pub url_2: Option<String>,
    #[serde(default)]
    pub url_3: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub last_content_hash: Option<String>,
    #[serde(default)]
    pub latest_report: Option<String>,
    #[serde(default)]
    pub last_check_at: Option<DateTime<Utc>>,
}

impl MonitoringJob {
    /// The non-empty target URLs, in column order. Column order is what makes
    /// the combined content hash stable across cycles.
    pub fn target_urls(&self) -> Vec<String> {
        [&self.url_1, &self.url_2, &self.url_3]
            .into_iter()
            .flatten()
            .filter(|u| !u.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// A user's subscription row. Created and updated only by webhook intake;
/// the orchestrator reads it to decide job eligibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub user_email: String,
    pub status: SubscriptionStatus,
    pub plan: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
}

/// Extracted text content of one URL at one point in time. Held only for the
/// duration of a single cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub url: String,
    pub text: String,
}

/// Terminal outcome of one monitoring cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    Failed(FailureReason),
    NoChanges,
    Success { report: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The job has no URLs configured yet.
    NoUrls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Every configured URL came back empty.
    ScrapeFailed,
    /// The report was generated but could not be persisted.
    StorageWrite(String),
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Skipped(SkipReason::NoUrls) => write!(f, "skipped(no_urls)"),
            CycleOutcome::Failed(FailureReason::ScrapeFailed) => write!(f, "error(scrape_failed)"),
            CycleOutcome::Failed(FailureReason::StorageWrite(msg)) => {
                write!(f, "error(storage: {})", msg)
            }
            CycleOutcome::NoChanges => write!(f, "no_changes"),
            CycleOutcome::Success { .. } => write!(f, "success"),
        }
    }
}

/// Truncate to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
