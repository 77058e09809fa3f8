//! The polling loop: query eligible jobs, run each cycle serially, sleep.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

use crate::cycle::run_cycle;
use crate::fetcher::PageFetcher;
use crate::notifier::Notifier;
use crate::storage::Storage;
use crate::summarizer::Summarizer;

pub struct Orchestrator<F, S, N, St> {
    fetcher: F,
    summarizer: S,
    notifier: N,
    storage: St,
    job_delay: Duration,
    check_interval: Duration,
}

impl<F, S, N, St> Orchestrator<F, S, N, St>
where
    F: PageFetcher,
    S: Summarizer,
    N: Notifier,
    St: Storage,
{
    pub fn new(
        fetcher: F,
        summarizer: S,
        notifier: N,
        storage: St,
        job_delay: Duration,
        check_interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            summarizer,
            notifier,
            storage,
            job_delay,
            check_interval,
        }
    }

    /// Process one batch of eligible jobs, returning how many were handled.
    ///
    /// A failed batch query logs and yields zero; a failed job logs its
    /// outcome and never stops the rest of the batch.
    pub async fn process_batch(&self) -> usize {
        let jobs = match self.storage.list_active_jobs().await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!(error = %e, "Failed to query monitoring jobs");
                return 0;
            }
        };

        if jobs.is_empty() {
            info!("No active jobs found");
            return 0;
        }

        info!(count = jobs.len(), "Processing monitoring jobs");

        let total = jobs.len();
        for (index, job) in jobs.iter().enumerate() {
            let outcome = run_cycle(
                job,
                &self.fetcher,
                &self.summarizer,
                &self.notifier,
                &self.storage,
            )
            .await;
            info!(user = %job.user_email, outcome = %outcome, "Cycle finished");

            // Pause between jobs to stay polite to the network and the model
            if index + 1 < total && !self.job_delay.is_zero() {
                sleep(self.job_delay).await;
            }
        }

        total
    }

    /// Test mode: exactly one batch, no inter-batch sleep.
    pub async fn run_once(&self) -> usize {
        info!("Running single test batch");
        self.process_batch().await
    }

    /// The continuous loop: batch, then sleep the check interval, forever.
    pub async fn run_loop(&self) {
        info!("Orchestrator started, monitoring active jobs");
        loop {
            let processed = self.process_batch().await;
            info!(
                processed = processed,
                sleep_secs = self.check_interval.as_secs(),
                "Batch complete, sleeping"
            );
            sleep(self.check_interval).await;
        }
    }
}
