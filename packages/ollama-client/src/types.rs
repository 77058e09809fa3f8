//! Request and response types for the Ollama REST API.

use serde::{Deserialize, Serialize};

/// Body for `POST /api/generate`.
///
/// Streaming is always disabled; the caller gets one completed response.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
        }
    }
}

/// Raw response from `POST /api/generate` (non-streaming).
#[derive(Debug, Deserialize)]
pub struct GenerateResponseRaw {
    pub response: String,
    #[serde(default)]
    pub total_duration: Option<u64>,
    #[serde(default)]
    pub eval_count: Option<u64>,
}

/// A locally installed model, as reported by `GET /api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Raw response from `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub struct TagsResponseRaw {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}
