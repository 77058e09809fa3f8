//! Shared in-memory doubles for the trait seams, used across the unit suites.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::fetcher::{FetchOutcome, PageFetcher};
use crate::notifier::Notifier;
use crate::storage::Storage;
use crate::summarizer::Summarizer;
use crate::types::{MonitoringJob, Subscription, SubscriptionStatus};

pub(crate) fn job(user_email: &str, urls: &[&str]) -> MonitoringJob {
    let mut columns = urls.iter().map(|u| Some(u.to_string()));
    MonitoringJob {
        user_email: user_email.to_string(),
        url_1: columns.next().flatten(),
        url_2: columns.next().flatten(),
        url_3: columns.next().flatten(),
        is_active: true,
        last_content_hash: None,
        latest_report: None,
        last_check_at: None,
    }
}

/// Fetcher serving canned outcomes per URL; unknown URLs come back empty.
pub(crate) struct MockFetcher {
    pub pages: HashMap<String, FetchOutcome>,
}

impl MockFetcher {
    pub fn serving(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, text)| (url.to_string(), FetchOutcome::Ok(text.to_string())))
                .collect(),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        self.pages.get(url).cloned().unwrap_or(FetchOutcome::Empty)
    }
}

/// Summarizer returning a fixed reply and recording every prompt it saw.
pub(crate) struct MockSummarizer {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl MockSummarizer {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, prompt: &str) -> String {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

/// Notifier recording (recipient, report) pairs.
#[derive(Default)]
pub(crate) struct MockNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_report(&self, recipient: &str, report: &str, _urls: &[String]) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), report.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCheck {
    pub user_email: String,
    pub content_hash: String,
    pub report: String,
}

/// In-memory storage implementing the full trait.
#[derive(Default)]
pub(crate) struct MemoryStorage {
    pub jobs: Mutex<Vec<MonitoringJob>>,
    pub subscriptions: Mutex<Vec<Subscription>>,
    pub recorded: Mutex<Vec<RecordedCheck>>,
    pub touched: Mutex<Vec<String>>,
    pub fail_writes: bool,
}

impl MemoryStorage {
    pub fn with_jobs(jobs: Vec<MonitoringJob>) -> Self {
        let subscriptions = jobs
            .iter()
            .map(|job| Subscription {
                user_email: job.user_email.clone(),
                status: SubscriptionStatus::Active,
                plan: "premium_50".to_string(),
            })
            .collect();
        Self {
            jobs: Mutex::new(jobs),
            subscriptions: Mutex::new(subscriptions),
            ..Default::default()
        }
    }

    pub fn refusing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list_active_jobs(&self) -> Result<Vec<MonitoringJob>> {
        let subscriptions = self.subscriptions.lock().unwrap();
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|job| job.is_active)
            .filter(|job| {
                subscriptions
                    .iter()
                    .any(|s| s.user_email == job.user_email && s.status == SubscriptionStatus::Active)
            })
            .cloned()
            .collect())
    }

    async fn record_check(
        &self,
        user_email: &str,
        content_hash: &str,
        report: &str,
        _checked_at: DateTime<Utc>,
    ) -> Result<()> {
        if self.fail_writes {
            bail!("storage write refused");
        }
        self.recorded.lock().unwrap().push(RecordedCheck {
            user_email: user_email.to_string(),
            content_hash: content_hash.to_string(),
            report: report.to_string(),
        });
        Ok(())
    }

    async fn touch_last_check(&self, user_email: &str, _checked_at: DateTime<Utc>) -> Result<()> {
        if self.fail_writes {
            bail!("storage write refused");
        }
        self.touched.lock().unwrap().push(user_email.to_string());
        Ok(())
    }

    async fn activate_subscription(&self, user_email: &str, plan: &str) -> Result<()> {
        if self.fail_writes {
            bail!("storage write refused");
        }
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if let Some(existing) = subscriptions
            .iter_mut()
            .find(|s| s.user_email == user_email)
        {
            existing.status = SubscriptionStatus::Active;
            existing.plan = plan.to_string();
        } else {
            subscriptions.push(Subscription {
                user_email: user_email.to_string(),
                status: SubscriptionStatus::Active,
                plan: plan.to_string(),
            });
        }
        Ok(())
    }

    async fn ensure_job(&self, user_email: &str) -> Result<()> {
        if self.fail_writes {
            bail!("storage write refused");
        }
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(existing) = jobs.iter_mut().find(|j| j.user_email == user_email) {
            existing.is_active = true;
        } else {
            jobs.push(job(user_email, &[]));
        }
        Ok(())
    }

    async fn count_jobs(&self) -> Result<u64> {
        Ok(self.jobs.lock().unwrap().len() as u64)
    }
}
