//! Error types for the chatstack launcher
//!
//! Every failure during startup is fatal: the orchestrator reports the
//! error, tears down whatever it already spawned, and exits non-zero.

use thiserror::Error;

/// Main error type for launcher operations
#[derive(Error, Debug)]
pub enum LaunchError {
    /// Readiness polling exhausted its retry budget
    #[error("{service} did not become ready after {attempts} attempts")]
    ReadinessTimeout { service: String, attempts: u32 },

    /// Ollama API errors
    #[error("Ollama API error: {0}")]
    OllamaApi(String),

    /// Model pull failures
    #[error("Model pull failed: {0}")]
    ModelPull(String),

    /// Connectivity probe failures
    #[error("Connectivity probe failed: {0}")]
    Probe(String),

    /// Child process spawn failures
    #[error("Failed to spawn {service}: {source}")]
    Spawn {
        service: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for launcher operations
pub type Result<T> = std::result::Result<T, LaunchError>;

/// Convert anyhow errors from config glue into LaunchError
impl From<anyhow::Error> for LaunchError {
    fn from(err: anyhow::Error) -> Self {
        LaunchError::Config(err.to_string())
    }
}
