//! Pure Ollama REST API client
//!
//! A clean, minimal client for a locally hosted Ollama server with no
//! domain-specific logic. Supports non-streaming text generation and model
//! listing (for health probes).
//!
//! # Example
//!
//! ```rust,ignore
//! use ollama_client::OllamaClient;
//!
//! let client = OllamaClient::new("http://localhost:11434");
//!
//! // One-shot completion
//! let text = client.generate("llama3.2:3b", "Summarize this change: ...").await?;
//!
//! // Installed models (health check)
//! let models = client.list_models().await?;
//! ```

pub mod error;
pub mod types;

pub use error::{OllamaError, Result};
pub use types::{GenerateRequest, ModelTag};

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default base URL for a local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Local inference can take minutes on modest hardware.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(500);

/// Model listing is cheap; fail fast when the server is down.
const TAGS_TIMEOUT: Duration = Duration::from_secs(5);

/// Ollama API client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http_client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a new client against the given base URL
    /// (e.g. `http://localhost:11434`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Non-streaming text generation.
    ///
    /// Sends the prompt to `POST /api/generate` and returns the completed
    /// response text.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let start = std::time::Instant::now();
        let request = GenerateRequest::new(model, prompt);

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(GENERATE_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Ollama request failed");
                OllamaError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Ollama API error");
            return Err(OllamaError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let raw: types::GenerateResponseRaw = response
            .json()
            .await
            .map_err(|e| OllamaError::Parse(e.to_string()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            eval_count = ?raw.eval_count,
            "Ollama generation complete"
        );

        Ok(raw.response)
    }

    /// List locally installed models via `GET /api/tags`.
    pub async fn list_models(&self) -> Result<Vec<ModelTag>> {
        let response = self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Ollama is not reachable");
                OllamaError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OllamaError::Api(format!("HTTP {}", status)));
        }

        let raw: types::TagsResponseRaw = response
            .json()
            .await
            .map_err(|e| OllamaError::Parse(e.to_string()))?;

        Ok(raw.models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = OllamaClient::new("http://localhost:11434/");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn generate_request_disables_streaming() {
        let request = GenerateRequest::new("llama3.2:3b", "hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], serde_json::Value::Bool(false));
        assert_eq!(json["model"], "llama3.2:3b");
    }
}
