//! Email alerts over SMTP.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::config::SmtpCredentials;

/// STARTTLS submission port.
const SUBMISSION_PORT: u16 = 587;

const REPORT_SUBJECT: &str = "Intelligence Alert: Competitor Changes Detected";

/// Trait for report notification (to allow mocking).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_report(&self, recipient: &str, report: &str, urls: &[String]) -> Result<()>;
}

/// Production notifier: plain-text email over SMTP with STARTTLS.
pub struct SmtpNotifier {
    host: String,
    credentials: Option<SmtpCredentials>,
}

impl SmtpNotifier {
    pub fn new(host: impl Into<String>, credentials: Option<SmtpCredentials>) -> Self {
        Self {
            host: host.into(),
            credentials,
        }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_report(&self, recipient: &str, report: &str, urls: &[String]) -> Result<()> {
        let Some(credentials) = &self.credentials else {
            warn!("Email credentials not configured, skipping alert");
            return Ok(());
        };

        let message = Message::builder()
            .from(
                credentials
                    .username
                    .parse()
                    .context("Sender address is not a valid mailbox")?,
            )
            .to(recipient
                .parse()
                .context("Recipient address is not a valid mailbox")?)
            .subject(REPORT_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(format_report_email(report, urls))
            .context("Failed to build alert email")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .context("Failed to configure SMTP relay")?
            .port(SUBMISSION_PORT)
            .credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.clone(),
            ))
            .build();

        transport
            .send(message)
            .await
            .context("SMTP send failed")?;

        info!(recipient = %recipient, "Alert email sent");
        Ok(())
    }
}

/// Plain-text body of the alert email.
pub fn format_report_email(report: &str, urls: &[String]) -> String {
    let url_lines = urls
        .iter()
        .map(|url| format!("  - {}", url))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Intelligence Report\nGenerated: {}\n\nMonitored URLs:\n{}\n\n=== AI ANALYSIS ===\n\n{}\n\n===================================\n\nThis is an automated report from your competitor monitoring agent.\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        url_lines,
        report
    )
}
