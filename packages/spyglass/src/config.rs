use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
///
/// Constructed once at startup and passed by reference into component
/// constructors; there is no ambient global state.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub smtp_host: String,
    pub email_user: Option<String>,
    pub email_password: Option<String>,
    pub webhook_port: u16,
    /// Pause between jobs within a batch, to avoid bursting the model/network.
    pub job_delay: Duration,
    /// Sleep between batches in the continuous loop.
    pub check_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only the storage credentials are required; their absence is the one
    /// fatal startup condition.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            supabase_url: env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .context("SUPABASE_SERVICE_ROLE_KEY must be set")?,
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| ollama_client::DEFAULT_BASE_URL.to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2:3b".to_string()),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            email_user: env::var("EMAIL_USER").ok(),
            email_password: env::var("EMAIL_PASSWORD").ok(),
            webhook_port: env::var("WEBHOOK_PORT")
                .unwrap_or_else(|_| "4242".to_string())
                .parse()
                .context("WEBHOOK_PORT must be a valid port number")?,
            job_delay: duration_from_env("JOB_DELAY_SECS", 5)?,
            check_interval: duration_from_env("CHECK_INTERVAL_SECS", 3600)?,
        })
    }

    /// SMTP credentials, when both halves are configured.
    pub fn smtp_credentials(&self) -> Option<SmtpCredentials> {
        match (&self.email_user, &self.email_password) {
            (Some(username), Some(password)) => Some(SmtpCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

/// Sender credentials for the SMTP submission.
#[derive(Debug, Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

fn duration_from_env(var: &str, default_secs: u64) -> Result<Duration> {
    let secs = match env::var(var) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{} must be a number of seconds", var))?,
        Err(_) => default_secs,
    };
    Ok(Duration::from_secs(secs))
}
