//! The per-job monitoring cycle: fetch all configured URLs, detect changes,
//! summarize, persist, notify.
//!
//! One synchronous pass per job keeps the failure blast radius to a single
//! user; every failure path maps to a terminal [`CycleOutcome`] and never
//! propagates as an error to the orchestrator.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::detector::{combine_snapshots, detect_change, ChangeDetection};
use crate::fetcher::{FetchOutcome, PageFetcher};
use crate::notifier::Notifier;
use crate::storage::Storage;
use crate::summarizer::{build_prompt, Summarizer};
use crate::types::{CycleOutcome, FailureReason, MonitoringJob, SkipReason, Snapshot};

/// Run one monitoring cycle for a single job.
pub async fn run_cycle(
    job: &MonitoringJob,
    fetcher: &impl PageFetcher,
    summarizer: &impl Summarizer,
    notifier: &impl Notifier,
    storage: &impl Storage,
) -> CycleOutcome {
    info!(user = %job.user_email, "Starting monitoring cycle");

    let urls = job.target_urls();
    if urls.is_empty() {
        debug!(user = %job.user_email, "Job has no URLs configured");
        return CycleOutcome::Skipped(SkipReason::NoUrls);
    }

    let mut snapshots = Vec::new();
    for url in &urls {
        match fetcher.fetch(url).await {
            FetchOutcome::Ok(text) => snapshots.push(Snapshot {
                url: url.clone(),
                text,
            }),
            outcome => debug!(url = %url, outcome = ?outcome, "No usable content"),
        }
    }

    if snapshots.is_empty() {
        warn!(user = %job.user_email, "Every target fetch came back empty");
        return CycleOutcome::Failed(FailureReason::ScrapeFailed);
    }

    let combined = combine_snapshots(&snapshots);
    let now = Utc::now();

    match detect_change(&combined, job.last_content_hash.as_deref()) {
        ChangeDetection::Unchanged { .. } => {
            debug!(user = %job.user_email, "No changes detected");
            // Refresh the timestamp so a quiet job is distinguishable from a
            // dead agent.
            if let Err(e) = storage.touch_last_check(&job.user_email, now).await {
                warn!(user = %job.user_email, error = %e, "Failed to update last_check_at");
            }
            CycleOutcome::NoChanges
        }
        ChangeDetection::Changed { digest } => {
            info!(user = %job.user_email, "Changes detected, generating analysis");

            let prompt = build_prompt(&combined);
            let report = summarizer.summarize(&prompt).await;

            if let Err(e) = storage
                .record_check(&job.user_email, &digest, &report, now)
                .await
            {
                error!(user = %job.user_email, error = %e, "Failed to persist report");
                return CycleOutcome::Failed(FailureReason::StorageWrite(e.to_string()));
            }

            if let Err(e) = notifier.send_report(&job.user_email, &report, &urls).await {
                warn!(user = %job.user_email, error = %e, "Failed to send alert email");
            }

            CycleOutcome::Success { report }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::content_digest;
    use crate::testing::{job, MemoryStorage, MockFetcher, MockNotifier, MockSummarizer};

    #[tokio::test]
    async fn skipped_when_no_urls_configured() {
        let job = job("user@example.com", &[]);
        let outcome = run_cycle(
            &job,
            &MockFetcher::unreachable(),
            &MockSummarizer::replying("unused"),
            &MockNotifier::default(),
            &MemoryStorage::default(),
        )
        .await;

        assert_eq!(outcome, CycleOutcome::Skipped(SkipReason::NoUrls));
    }

    #[tokio::test]
    async fn scrape_failure_when_every_fetch_is_empty() {
        let job = job("user@example.com", &["https://down.example.com"]);
        let storage = MemoryStorage::default();
        let outcome = run_cycle(
            &job,
            &MockFetcher::unreachable(),
            &MockSummarizer::replying("unused"),
            &MockNotifier::default(),
            &storage,
        )
        .await;

        assert_eq!(outcome, CycleOutcome::Failed(FailureReason::ScrapeFailed));
        assert!(storage.recorded.lock().unwrap().is_empty());
        assert!(storage.touched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unchanged_content_still_refreshes_the_timestamp() {
        let mut job = job("user@example.com", &["https://a.example.com"]);
        let combined = "URL: https://a.example.com\nProduct X price $10";
        job.last_content_hash = Some(content_digest(combined));

        let storage = MemoryStorage::default();
        let summarizer = MockSummarizer::replying("unused");
        let outcome = run_cycle(
            &job,
            &MockFetcher::serving(&[("https://a.example.com", "Product X price $10")]),
            &summarizer,
            &MockNotifier::default(),
            &storage,
        )
        .await;

        assert_eq!(outcome, CycleOutcome::NoChanges);
        assert_eq!(
            storage.touched.lock().unwrap().as_slice(),
            ["user@example.com"]
        );
        // No summarization on a quiet cycle
        assert!(summarizer.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_check_runs_the_full_pipeline() {
        let job = job("user@example.com", &["https://a.example.com"]);
        let storage = MemoryStorage::default();
        let summarizer = MockSummarizer::replying("Competitor lowered pricing.");
        let notifier = MockNotifier::default();

        let outcome = run_cycle(
            &job,
            &MockFetcher::serving(&[("https://a.example.com", "Product X price $10")]),
            &summarizer,
            &notifier,
            &storage,
        )
        .await;

        assert_eq!(
            outcome,
            CycleOutcome::Success {
                report: "Competitor lowered pricing.".to_string()
            }
        );

        // The prompt carried the scraped content
        let prompts = summarizer.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Product X price $10"));

        // Hash and report were persisted together
        let recorded = storage.recorded.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].user_email, "user@example.com");
        assert_eq!(recorded[0].report, "Competitor lowered pricing.");
        assert_eq!(recorded[0].content_hash.len(), 32);

        // Exactly one email, to the job's own address
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "user@example.com");
        assert_eq!(sent[0].1, "Competitor lowered pricing.");
    }

    #[tokio::test]
    async fn persistence_failure_degrades_to_error_outcome() {
        let job = job("user@example.com", &["https://a.example.com"]);
        let storage = MemoryStorage::refusing_writes();
        let notifier = MockNotifier::default();

        let outcome = run_cycle(
            &job,
            &MockFetcher::serving(&[("https://a.example.com", "Product X price $10")]),
            &MockSummarizer::replying("report"),
            &notifier,
            &storage,
        )
        .await;

        match outcome {
            CycleOutcome::Failed(FailureReason::StorageWrite(message)) => {
                assert!(message.contains("refused"));
            }
            other => panic!("expected storage failure, got {:?}", other),
        }
        // No alert goes out for a report that was never persisted
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_fetch_failure_still_analyzes_remaining_pages() {
        let job = job(
            "user@example.com",
            &["https://down.example.com", "https://up.example.com"],
        );
        let storage = MemoryStorage::default();
        let summarizer = MockSummarizer::replying("report");

        let outcome = run_cycle(
            &job,
            &MockFetcher::serving(&[("https://up.example.com", "New product launched")]),
            &summarizer,
            &MockNotifier::default(),
            &storage,
        )
        .await;

        assert!(matches!(outcome, CycleOutcome::Success { .. }));
        let prompts = summarizer.prompts.lock().unwrap();
        assert!(prompts[0].contains("New product launched"));
        assert!(!prompts[0].contains("down.example.com"));
    }
}
