//! Doctor command for stack diagnostics
//!
//! Runs the launcher's health checks without starting anything.

use crate::backend::BackendProbe;
use crate::ollama::OllamaClient;
use colored::Colorize;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::System;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

/// Stack diagnostics
pub struct Doctor {
    ollama_url: String,
    backend_url: String,
    model: String,
    log_dir: PathBuf,
}

impl Doctor {
    /// Create a new doctor instance
    pub fn new(ollama_url: String, backend_url: String, model: String, log_dir: PathBuf) -> Self {
        Self {
            ollama_url,
            backend_url,
            model,
            log_dir,
        }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        vec![
            self.check_ollama_api().await,
            self.check_model_present().await,
            self.check_backend().await,
            self.check_log_dir(),
            self.check_disk_space(),
            self.check_memory(),
        ]
    }

    /// Check 1: Ollama API reachable
    async fn check_ollama_api(&self) -> HealthCheck {
        let client = OllamaClient::new(&self.ollama_url).silent();

        let status = if client.server_ready().await {
            HealthStatus::Pass
        } else {
            HealthStatus::Fail("Ollama not running or not reachable".to_string())
        };

        HealthCheck {
            name: "Ollama API".to_string(),
            status,
        }
    }

    /// Check 2: configured model present in the catalog
    async fn check_model_present(&self) -> HealthCheck {
        let client = OllamaClient::new(&self.ollama_url).silent();

        let status = match client.model_present(&self.model).await {
            Ok(true) => HealthStatus::Pass,
            Ok(false) => HealthStatus::Warn(format!(
                "Model '{}' not installed; 'chatstack up' will pull it",
                self.model
            )),
            Err(e) => HealthStatus::Fail(format!("Cannot check models: {}", e)),
        };

        HealthCheck {
            name: "Model".to_string(),
            status,
        }
    }

    /// Check 3: backend health endpoint
    async fn check_backend(&self) -> HealthCheck {
        let probe = BackendProbe::new(&self.backend_url);
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap_or_else(|_| Client::new());

        let status = match client.get(probe.health_url()).send().await {
            Ok(response) if response.status().is_success() => HealthStatus::Pass,
            Ok(response) => {
                HealthStatus::Warn(format!("Backend answered {}", response.status()))
            }
            Err(_) => HealthStatus::Warn(
                "Backend not running (normal before 'chatstack up')".to_string(),
            ),
        };

        HealthCheck {
            name: "Backend".to_string(),
            status,
        }
    }

    /// Check 4: log directory writable
    fn check_log_dir(&self) -> HealthCheck {
        let status = match std::fs::create_dir_all(&self.log_dir) {
            Ok(()) => {
                let test_file = self.log_dir.join(".chatstack_write_test");
                match std::fs::write(&test_file, "test") {
                    Ok(()) => {
                        let _ = std::fs::remove_file(&test_file);
                        HealthStatus::Pass
                    }
                    Err(_) => {
                        HealthStatus::Fail("No write permission in log directory".to_string())
                    }
                }
            }
            Err(e) => HealthStatus::Fail(format!("Cannot create log directory: {}", e)),
        };

        HealthCheck {
            name: "Log Directory".to_string(),
            status,
        }
    }

    /// Check 5: disk space for model downloads
    fn check_disk_space(&self) -> HealthCheck {
        use sysinfo::Disks;
        let disks = Disks::new_with_refreshed_list();

        let log_path = Path::new(&self.log_dir);

        for disk in &disks {
            if log_path.starts_with(disk.mount_point()) {
                let available_gb = disk.available_space() / (1024 * 1024 * 1024);

                let status = if available_gb < 1 {
                    HealthStatus::Fail(format!(
                        "Less than 1GB available ({} GB); model pulls will fail",
                        available_gb
                    ))
                } else if available_gb < 5 {
                    HealthStatus::Warn(format!("Low disk space ({} GB available)", available_gb))
                } else {
                    HealthStatus::Pass
                };

                return HealthCheck {
                    name: "Disk Space".to_string(),
                    status,
                };
            }
        }

        HealthCheck {
            name: "Disk Space".to_string(),
            status: HealthStatus::Warn("Could not determine disk space".to_string()),
        }
    }

    /// Check 6: memory headroom for the model server
    fn check_memory(&self) -> HealthCheck {
        let mut sys = System::new_all();
        sys.refresh_memory();

        let available_gb = sys.available_memory() / (1024 * 1024 * 1024);

        let status = if available_gb < 1 {
            HealthStatus::Fail(format!(
                "Less than 1GB RAM available ({} GB)",
                available_gb
            ))
        } else if available_gb < 2 {
            HealthStatus::Warn(format!("Low memory ({} GB available)", available_gb))
        } else {
            HealthStatus::Pass
        };

        HealthCheck {
            name: "Memory".to_string(),
            status,
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\nchatstack diagnostics\n");

        for check in checks {
            let line = match &check.status {
                HealthStatus::Pass => format!("{} {:<15} PASS", "✓".green(), check.name),
                HealthStatus::Warn(msg) => {
                    format!("{} {:<15} WARN: {}", "!".yellow(), check.name, msg)
                }
                HealthStatus::Fail(msg) => {
                    format!("{} {:<15} FAIL: {}", "✗".red(), check.name, msg)
                }
            };
            println!("{}", line);
        }

        println!();
    }

    /// Get overall health status; only Fail results count against it
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn doctor_for(ollama_url: &str, log_dir: &Path) -> Doctor {
        Doctor::new(
            ollama_url.to_string(),
            "http://127.0.0.1:5002".to_string(),
            "qwen2.5:0.5b".to_string(),
            log_dir.to_path_buf(),
        )
    }

    #[test]
    fn test_overall_status_ignores_warnings() {
        let checks = vec![
            HealthCheck {
                name: "A".to_string(),
                status: HealthStatus::Pass,
            },
            HealthCheck {
                name: "B".to_string(),
                status: HealthStatus::Warn("warning".to_string()),
            },
        ];
        assert!(Doctor::overall_status(&checks));
    }

    #[test]
    fn test_overall_status_fails_on_fail() {
        let checks = vec![HealthCheck {
            name: "A".to_string(),
            status: HealthStatus::Fail("broken".to_string()),
        }];
        assert!(!Doctor::overall_status(&checks));
    }

    #[tokio::test]
    async fn test_check_ollama_api_down() {
        let tmp = TempDir::new().unwrap();
        let doctor = doctor_for("http://127.0.0.1:9", tmp.path());

        let check = doctor.check_ollama_api().await;
        assert!(matches!(check.status, HealthStatus::Fail(_)));
    }

    #[tokio::test]
    async fn test_check_model_missing_is_warning() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200)
                .json_body(serde_json::json!({"models": []}));
        });

        let tmp = TempDir::new().unwrap();
        let doctor = doctor_for(&server.base_url(), tmp.path());

        let check = doctor.check_model_present().await;
        assert!(matches!(check.status, HealthStatus::Warn(_)));
    }

    #[test]
    fn test_check_log_dir_writable() {
        let tmp = TempDir::new().unwrap();
        let doctor = doctor_for("http://127.0.0.1:11434", tmp.path());

        let check = doctor.check_log_dir();
        assert_eq!(check.status, HealthStatus::Pass);
    }
}
