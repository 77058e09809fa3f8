use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::MonitoringJob;

pub mod supabase;
pub use supabase::SupabaseStorage;

/// Storage trait for monitoring state.
///
/// The backing store is an external collaborator; this trait is the full
/// contract the worker expects from it: select-with-filter, update-by-key,
/// and upsert-by-key.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Monitoring jobs with `is_active = true` whose owning subscription is
    /// active, in storage order.
    async fn list_active_jobs(&self) -> Result<Vec<MonitoringJob>>;

    /// Persist the result of a changed cycle. Hash, report, and timestamp are
    /// written in one update so they always describe the same content
    /// version.
    async fn record_check(
        &self,
        user_email: &str,
        content_hash: &str,
        report: &str,
        checked_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Refresh only the freshness timestamp (unchanged cycle).
    async fn touch_last_check(&self, user_email: &str, checked_at: DateTime<Utc>) -> Result<()>;

    /// Idempotent create-or-activate of a subscription, keyed by email.
    async fn activate_subscription(&self, user_email: &str, plan: &str) -> Result<()>;

    /// Idempotent create-or-activate of a monitoring job, keyed by email.
    /// URL columns are left for later configuration.
    async fn ensure_job(&self, user_email: &str) -> Result<()>;

    /// Total monitoring job count (health probe).
    async fn count_jobs(&self) -> Result<u64>;
}
