//! Report generation via the local model.
//!
//! The summarizer contract is deliberately infallible: on any client failure
//! it returns a human-readable error string, and that value still flows
//! through persistence and notification like a normal report.

use async_trait::async_trait;
use ollama_client::OllamaClient;
use tracing::{info, warn};

use crate::types::truncate_chars;

/// How much combined page content goes into the prompt. Smaller than the
/// snapshot cap so the preamble and instructions always fit comfortably in a
/// small local model's context.
pub const PROMPT_CONTEXT_CHARS: usize = 2000;

/// Trait for report generators (to allow mocking).
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Returns the model's completion, or a human-readable error string.
    async fn summarize(&self, prompt: &str) -> String;
}

/// Production summarizer backed by a local Ollama server.
pub struct OllamaSummarizer {
    client: OllamaClient,
    model: String,
}

impl OllamaSummarizer {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(&self, prompt: &str) -> String {
        info!(model = %self.model, "Consulting local model");
        match self.client.generate(&self.model, prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Summarization failed");
                format!("AI error: {}", e)
            }
        }
    }
}

/// Build the analysis prompt from the combined snapshot content.
pub fn build_prompt(combined: &str) -> String {
    format!(
        "You are an expert competitive intelligence analyst. Analyze these competitor websites:\n{}\nFocus on pricing, new products, and marketing changes. Keep it concise.",
        truncate_chars(combined, PROMPT_CONTEXT_CHARS)
    )
}
