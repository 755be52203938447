//! Wire types for the Ollama model-management API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in the Ollama model catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Model tag (e.g., "qwen2.5:0.5b")
    pub name: String,

    /// Model size in bytes
    #[serde(default)]
    pub size: u64,

    /// Model digest/hash
    #[serde(default)]
    pub digest: String,

    /// Last modification time
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Response from the `GET /api/tags` catalog endpoint
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    pub models: Vec<ModelSummary>,
}

/// One line of the `POST /api/pull` progress stream
#[derive(Debug, Deserialize)]
pub struct PullEvent {
    /// Status message ("pulling manifest", "success", ...)
    #[serde(default)]
    pub status: String,

    /// Error message, present when the pull failed
    #[serde(default)]
    pub error: Option<String>,

    /// Total bytes for the current layer
    #[serde(default)]
    pub total: Option<u64>,

    /// Bytes completed for the current layer
    #[serde(default)]
    pub completed: Option<u64>,
}

impl ModelSummary {
    /// Match a requested tag against this catalog entry.
    ///
    /// Ollama treats a bare name as `name:latest`, so "llama3" matches the
    /// installed "llama3:latest".
    pub fn matches(&self, requested: &str) -> bool {
        if self.name == requested {
            return true;
        }
        !requested.contains(':') && self.name == format!("{}:latest", requested)
    }
}
