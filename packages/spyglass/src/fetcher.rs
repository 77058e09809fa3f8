//! Page fetching - retrieves a competitor page as normalized text.
//!
//! Every failure mode degrades to a non-`Ok` outcome with a logged
//! diagnostic; the fetcher never surfaces an error to the caller and never
//! retries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::truncate_chars;

/// Per-request fetch timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Snapshots are capped so one bloated page cannot dominate the combined
/// content fed into hashing and analysis.
pub const MAX_CONTENT_CHARS: usize = 3000;

/// Outcome of fetching a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Normalized, truncated page text.
    Ok(String),
    /// Transport failure or a page with no extractable text.
    Empty,
    /// The request exceeded the fetch timeout.
    Timeout,
    /// The server answered with a non-success status.
    HttpError(StatusCode),
}

impl FetchOutcome {
    pub fn into_text(self) -> Option<String> {
        match self {
            FetchOutcome::Ok(text) => Some(text),
            _ => None,
        }
    }
}

/// Trait for page fetchers (to allow mocking).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Production fetcher using reqwest + scraper.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        // Browser-like User-Agent to avoid trivial bot blocking
        let user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        debug!(url = %url, "Fetching page");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(url = %url, "Fetch timed out");
                return FetchOutcome::Timeout;
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch failed");
                return FetchOutcome::Empty;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "HTTP error");
            return FetchOutcome::HttpError(status);
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to read response body");
                return FetchOutcome::Empty;
            }
        };

        let text = extract_text(&html);
        if text.is_empty() {
            debug!(url = %url, "Page has no extractable text");
            FetchOutcome::Empty
        } else {
            FetchOutcome::Ok(text)
        }
    }
}

/// Extract whitespace-normalized text from an HTML document, truncated to
/// [`MAX_CONTENT_CHARS`].
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&normalized, MAX_CONTENT_CHARS).to_string()
}
