//! Ollama server client and wire types

pub mod client;
pub mod types;

pub use client::{EnsureOutcome, OllamaClient};
pub use types::{ModelSummary, PullEvent, TagsResponse};
