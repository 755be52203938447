//! Fixed-budget readiness polling
//!
//! Repeatedly issues a lightweight GET against a health endpoint until a
//! success response is observed or the retry budget is exhausted. The
//! interval is fixed: no backoff, no jitter, and every non-success
//! (connection refused, timeout, non-2xx) counts the same.

use crate::errors::{LaunchError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;

/// Default readiness poll attempts per service
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default delay between attempts
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Per-request timeout; a hanging endpoint must not stall the whole budget
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Readiness poller with a fixed attempt budget and fixed interval
#[derive(Debug, Clone)]
pub struct ReadinessPoller {
    client: Client,
    max_attempts: u32,
    interval: Duration,
    show_progress: bool,
}

impl Default for ReadinessPoller {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_INTERVAL)
    }
}

impl ReadinessPoller {
    /// Create a poller with the given attempt budget and interval
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            max_attempts,
            interval,
            show_progress: true,
        }
    }

    /// Disable the progress spinner (quiet mode and tests)
    pub fn silent(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Poll `url` until it answers 2xx, or fail after the attempt budget.
    ///
    /// `service` labels the spinner and the timeout error.
    pub async fn wait_until_ready(&self, url: &str, service: &str) -> Result<()> {
        let spinner = if self.show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        for attempt in 1..=self.max_attempts {
            if let Some(pb) = &spinner {
                pb.set_message(format!(
                    "waiting for {} ({}/{})",
                    service, attempt, self.max_attempts
                ));
            }

            if self.probe(url).await {
                if let Some(pb) = &spinner {
                    pb.finish_and_clear();
                }
                return Ok(());
            }

            // No sleep after the final attempt
            if attempt < self.max_attempts {
                sleep(self.interval).await;
            }
        }

        if let Some(pb) = &spinner {
            pb.finish_and_clear();
        }

        Err(LaunchError::ReadinessTimeout {
            service: service.to_string(),
            attempts: self.max_attempts,
        })
    }

    /// One readiness probe; any transport error or non-2xx is a miss
    async fn probe(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Get the configured attempt budget
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
