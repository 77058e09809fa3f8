//! Supabase-backed storage over the PostgREST interface.
//!
//! Row filters and upserts go through the hosted REST surface with the
//! service-role key, so the worker needs exactly two credentials: the project
//! URL and the key.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::json;
use std::time::Duration;

use crate::storage::Storage;
use crate::types::{MonitoringJob, Subscription, SubscriptionStatus};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_role_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth: HeaderValue = format!("Bearer {}", service_role_key)
            .parse()
            .context("Service role key is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            "apikey",
            service_role_key
                .parse()
                .context("Service role key is not a valid header value")?,
        );

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .context("Failed to create storage client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Key-filtered table URL for single-row updates.
    fn job_row_url(&self, user_email: &str) -> String {
        format!(
            "{}?user_email=eq.{}",
            self.table_url("monitoring_jobs"),
            urlencoding::encode(user_email)
        )
    }

    /// Upsert keyed on `user_email`; retried provider webhooks and repeat
    /// payments merge into the existing row.
    async fn upsert(&self, table: &str, body: &serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", "user_email")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(body)
            .send()
            .await
            .with_context(|| format!("Upsert into {} failed", table))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("Upsert into {} failed: HTTP {}: {}", table, status, error_text);
        }
        Ok(())
    }

    async fn update_job(&self, user_email: &str, body: &serde_json::Value) -> Result<()> {
        let response = self
            .client
            .patch(self.job_row_url(user_email))
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await
            .context("Monitoring job update failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("Monitoring job update failed: HTTP {}: {}", status, error_text);
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for SupabaseStorage {
    async fn list_active_jobs(&self) -> Result<Vec<MonitoringJob>> {
        // Inner-join the owning subscription so inactive subscribers drop out
        // of the batch server-side.
        let response = self
            .client
            .get(self.table_url("monitoring_jobs"))
            .query(&[
                ("select", "*,subscriptions!inner(status)"),
                ("is_active", "eq.true"),
                ("subscriptions.status", "eq.active"),
            ])
            .send()
            .await
            .context("Active jobs query failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            bail!("Active jobs query failed: HTTP {}: {}", status, error_text);
        }

        response
            .json()
            .await
            .context("Failed to decode monitoring job rows")
    }

    async fn record_check(
        &self,
        user_email: &str,
        content_hash: &str,
        report: &str,
        checked_at: DateTime<Utc>,
    ) -> Result<()> {
        self.update_job(
            user_email,
            &json!({
                "last_content_hash": content_hash,
                "latest_report": report,
                "last_check_at": checked_at,
            }),
        )
        .await
    }

    async fn touch_last_check(&self, user_email: &str, checked_at: DateTime<Utc>) -> Result<()> {
        self.update_job(user_email, &json!({ "last_check_at": checked_at }))
            .await
    }

    async fn activate_subscription(&self, user_email: &str, plan: &str) -> Result<()> {
        let subscription = Subscription {
            user_email: user_email.to_string(),
            status: SubscriptionStatus::Active,
            plan: plan.to_string(),
        };
        self.upsert("subscriptions", &serde_json::to_value(subscription)?)
            .await
    }

    async fn ensure_job(&self, user_email: &str) -> Result<()> {
        // Only the key and the active flag: a repeat payment must not blank
        // out URLs the user already configured.
        self.upsert(
            "monitoring_jobs",
            &json!({ "user_email": user_email, "is_active": true }),
        )
        .await
    }

    async fn count_jobs(&self) -> Result<u64> {
        let response = self
            .client
            .get(self.table_url("monitoring_jobs"))
            .query(&[("select", "user_email"), ("limit", "1")])
            .header("Prefer", "count=exact")
            .send()
            .await
            .context("Job count query failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Job count query failed: HTTP {}", status);
        }

        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .context("Job count response missing Content-Range header")?;

        parse_exact_count(content_range)
            .with_context(|| format!("Unparseable Content-Range: {}", content_range))
    }
}

/// Parse the total from a PostgREST `Content-Range` header (`0-0/42`, `*/0`).
fn parse_exact_count(content_range: &str) -> Option<u64> {
    content_range.rsplit('/').next()?.parse().ok()
}
