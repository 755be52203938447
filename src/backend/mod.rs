//! Backend health target and connectivity probe
//!
//! Readiness is `GET /health` (handled by the poller); once ready, one
//! synthetic `POST /fetch` confirms the service accepts real traffic.

use crate::errors::{LaunchError, Result};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Health endpoint path on the backend
const HEALTH_PATH: &str = "/health";

/// Fetch endpoint path used for the synthetic probe
const FETCH_PATH: &str = "/fetch";

/// Probe timeout; the backend drives a real browser fetch behind this call
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for verifying the backend API
pub struct BackendProbe {
    client: Client,
    base_url: String,
}

impl BackendProbe {
    /// Create a probe for the given backend base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Readiness target for the poller
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, HEALTH_PATH)
    }

    /// Issue one synthetic fetch request. Single attempt; any transport
    /// error or non-2xx is fatal.
    pub async fn verify_connectivity(&self, probe_url: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, FETCH_PATH);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "url": probe_url }))
            .send()
            .await
            .map_err(|e| LaunchError::Probe(format!("Fetch request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LaunchError::Probe(format!(
                "Fetch returned status: {}",
                response.status()
            )));
        }

        Ok(())
    }
}
