//! HTTP client for the Ollama server
//!
//! Covers the two operations startup needs: the catalog check against
//! `GET /api/tags` and the one-shot `POST /api/pull` download.

use crate::errors::{LaunchError, Result};
use crate::ollama::types::{ModelSummary, PullEvent, TagsResponse};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Outcome of an idempotent model presence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// Model was already in the local catalog
    AlreadyPresent,
    /// Model was absent and has been pulled
    Pulled,
}

/// Client for the Ollama model-management API
pub struct OllamaClient {
    client: Client,
    base_url: String,
    show_progress: bool,
}

impl OllamaClient {
    /// Create a client for the given base URL (e.g. "http://127.0.0.1:11434")
    pub fn new(base_url: impl Into<String>) -> Self {
        // Long timeout: a cold pull downloads the whole model
        let client = Client::builder()
            .timeout(Duration::from_secs(1800))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            show_progress: true,
        }
    }

    /// Disable the pull progress bar (quiet mode and tests)
    pub fn silent(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Catalog URL, the lightweight readiness target for the model server
    pub fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }

    /// Check if the Ollama server answers at all
    pub async fn server_ready(&self) -> bool {
        match self
            .client
            .get(self.tags_url())
            .timeout(Duration::from_secs(2))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// List models installed on the server
    pub async fn list_models(&self) -> Result<Vec<ModelSummary>> {
        let response = self
            .client
            .get(self.tags_url())
            .send()
            .await
            .map_err(|e| LaunchError::OllamaApi(format!("Failed to query catalog: {}", e)))?;

        if !response.status().is_success() {
            return Err(LaunchError::OllamaApi(format!(
                "Catalog returned status: {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LaunchError::OllamaApi(format!("Failed to parse catalog: {}", e)))?;

        Ok(tags.models)
    }

    /// Check if a specific model is in the local catalog
    pub async fn model_present(&self, name: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m.matches(name)))
    }

    /// Pull (download) a model. Single attempt, no retry.
    ///
    /// Consumes the line-delimited JSON progress stream from
    /// `POST /api/pull`; an `error` line or a non-2xx status is fatal.
    pub async fn pull_model(&self, name: &str) -> Result<()> {
        let url = format!("{}/api/pull", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(|e| LaunchError::ModelPull(format!("Failed to reach server: {}", e)))?;

        if !response.status().is_success() {
            return Err(LaunchError::ModelPull(format!(
                "Pull returned status: {}",
                response.status()
            )));
        }

        let bar = if self.show_progress {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::with_template(
                    "{msg} [{bar:30}] {bytes}/{total_bytes}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb.set_message(format!("pulling {}", name));
            Some(pb)
        } else {
            None
        };

        let result = Self::consume_pull_stream(response, name, bar.as_ref()).await;

        if let Some(pb) = &bar {
            pb.finish_and_clear();
        }

        result
    }

    /// Drain the pull progress stream until a terminal event.
    ///
    /// Only a `success` event counts as completion; an `error` event is
    /// fatal, and so is a stream that ends without either.
    async fn consume_pull_stream(
        response: reqwest::Response,
        name: &str,
        bar: Option<&ProgressBar>,
    ) -> Result<()> {
        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| LaunchError::ModelPull(format!("Pull stream error: {}", e)))?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            // Progress lines are newline-delimited JSON objects
            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim().to_string();
                buffer.drain(..=pos);

                if Self::apply_pull_event(&line, name, bar)? {
                    return Ok(());
                }
            }
        }

        // The terminal event may arrive without a trailing newline
        let residual = buffer.trim().to_string();
        if Self::apply_pull_event(&residual, name, bar)? {
            return Ok(());
        }

        Err(LaunchError::ModelPull(format!(
            "Pull stream for {} ended without a success event",
            name
        )))
    }

    /// Handle one progress line; true means the pull reported success.
    /// Unparseable lines are skipped, an `error` event is fatal.
    fn apply_pull_event(line: &str, name: &str, bar: Option<&ProgressBar>) -> Result<bool> {
        if line.is_empty() {
            return Ok(false);
        }

        let event: PullEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(_) => return Ok(false),
        };

        if let Some(error) = event.error {
            return Err(LaunchError::ModelPull(error));
        }

        if let Some(pb) = bar {
            if let (Some(total), Some(completed)) = (event.total, event.completed) {
                pb.set_length(total);
                pb.set_position(completed);
            }
            if !event.status.is_empty() {
                pb.set_message(format!("pulling {}: {}", name, event.status));
            }
        }

        Ok(event.status == "success")
    }

    /// Make sure `name` is available locally, pulling it at most once.
    pub async fn ensure_model(&self, name: &str) -> Result<EnsureOutcome> {
        if self.model_present(name).await? {
            return Ok(EnsureOutcome::AlreadyPresent);
        }

        self.pull_model(name).await?;
        Ok(EnsureOutcome::Pulled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn catalog_body(names: &[&str]) -> serde_json::Value {
        json!({
            "models": names
                .iter()
                .map(|n| json!({"name": n, "size": 1024, "digest": "d"}))
                .collect::<Vec<_>>()
        })
    }

    #[test]
    fn test_base_url_normalization() {
        let client = OllamaClient::new("http://127.0.0.1:11434/");
        assert_eq!(client.tags_url(), "http://127.0.0.1:11434/api/tags");
    }

    #[tokio::test]
    async fn test_server_ready() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(catalog_body(&[]));
        });

        let client = OllamaClient::new(server.base_url()).silent();
        assert!(client.server_ready().await);
    }

    #[tokio::test]
    async fn test_server_not_ready() {
        let client = OllamaClient::new("http://127.0.0.1:9").silent();
        assert!(!client.server_ready().await);
    }

    #[tokio::test]
    async fn test_model_present() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200)
                .json_body(catalog_body(&["qwen2.5:0.5b", "llama3:latest"]));
        });

        let client = OllamaClient::new(server.base_url()).silent();
        assert!(client.model_present("qwen2.5:0.5b").await.unwrap());
        assert!(client.model_present("llama3").await.unwrap());
        assert!(!client.model_present("mistral:7b").await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_model_skips_pull_when_present() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(catalog_body(&["qwen2.5:0.5b"]));
        });
        let pull = server.mock(|when, then| {
            when.method(POST).path("/api/pull");
            then.status(200).body("{\"status\":\"success\"}\n");
        });

        let client = OllamaClient::new(server.base_url()).silent();
        let outcome = client.ensure_model("qwen2.5:0.5b").await.unwrap();

        assert_eq!(outcome, EnsureOutcome::AlreadyPresent);
        assert_eq!(pull.hits(), 0);
    }

    #[tokio::test]
    async fn test_ensure_model_pulls_exactly_once_when_absent() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(catalog_body(&["llama3:latest"]));
        });
        let pull = server.mock(|when, then| {
            when.method(POST)
                .path("/api/pull")
                .json_body(json!({"name": "qwen2.5:0.5b"}));
            then.status(200).body(
                "{\"status\":\"pulling manifest\"}\n{\"status\":\"downloading\",\"total\":100,\"completed\":100}\n{\"status\":\"success\"}\n",
            );
        });

        let client = OllamaClient::new(server.base_url()).silent();
        let outcome = client.ensure_model("qwen2.5:0.5b").await.unwrap();

        assert_eq!(outcome, EnsureOutcome::Pulled);
        assert_eq!(pull.hits(), 1);
    }

    #[tokio::test]
    async fn test_pull_error_line_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/pull");
            then.status(200)
                .body("{\"error\":\"pull model manifest: file does not exist\"}\n");
        });

        let client = OllamaClient::new(server.base_url()).silent();
        let result = client.pull_model("no-such-model:1b").await;

        assert!(matches!(result, Err(LaunchError::ModelPull(_))));
    }

    #[tokio::test]
    async fn test_pull_error_without_trailing_newline_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/pull");
            then.status(200)
                .body("{\"error\":\"pull model manifest: file does not exist\"}");
        });

        let client = OllamaClient::new(server.base_url()).silent();
        let result = client.pull_model("no-such-model:1b").await;

        assert!(matches!(result, Err(LaunchError::ModelPull(_))));
    }

    #[tokio::test]
    async fn test_pull_success_without_trailing_newline() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/pull");
            then.status(200)
                .body("{\"status\":\"pulling manifest\"}\n{\"status\":\"success\"}");
        });

        let client = OllamaClient::new(server.base_url()).silent();
        assert!(client.pull_model("qwen2.5:0.5b").await.is_ok());
    }

    #[tokio::test]
    async fn test_pull_stream_ending_without_success_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/pull");
            then.status(200).body(
                "{\"status\":\"downloading\",\"total\":100,\"completed\":100}\n",
            );
        });

        let client = OllamaClient::new(server.base_url()).silent();
        let result = client.pull_model("qwen2.5:0.5b").await;

        assert!(matches!(result, Err(LaunchError::ModelPull(_))));
    }

    #[tokio::test]
    async fn test_pull_http_failure_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/pull");
            then.status(500);
        });

        let client = OllamaClient::new(server.base_url()).silent();
        assert!(client.pull_model("qwen2.5:0.5b").await.is_err());
    }

    #[tokio::test]
    async fn test_list_models_bad_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(500);
        });

        let client = OllamaClient::new(server.base_url()).silent();
        assert!(matches!(
            client.list_models().await,
            Err(LaunchError::OllamaApi(_))
        ));
    }
}
