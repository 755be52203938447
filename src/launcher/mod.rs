//! Sequential startup orchestration
//!
//! Stages run strictly in order: model server, then backend, then frontend.
//! Each stage blocks until its predecessor is confirmed ready; any failure
//! aborts the whole startup, dumps the failing service's captured log, and
//! tears down everything spawned so far.

use crate::backend::BackendProbe;
use crate::config::ServicesConfig;
use crate::errors::Result;
use crate::ollama::{EnsureOutcome, OllamaClient};
use crate::poller::ReadinessPoller;
use crate::process::ServiceProcess;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// Lines of captured log dumped when a stage fails
const LOG_TAIL_LINES: usize = 40;

/// Everything the launcher needs to bring the stack up
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    /// Model tag to ensure is available locally
    pub model: String,

    /// Ollama server base URL
    pub ollama_host: String,

    /// Backend API base URL
    pub backend_url: String,

    /// Port the backend binds to (exported to the child)
    pub backend_port: u16,

    /// Port the frontend binds to (exported to the child)
    pub frontend_port: u16,

    /// Base URL path the frontend serves under (exported to the child)
    pub base_path: String,

    /// URL the synthetic connectivity probe asks the backend to fetch
    pub probe_url: String,

    /// Readiness poll attempts per service
    pub retries: u32,

    /// Delay between poll attempts
    pub poll_interval: Duration,

    /// Directory for captured service logs
    pub log_dir: PathBuf,

    /// Service command lines
    pub commands: ServicesConfig,

    /// Suppress progress and status output
    pub quiet: bool,
}

impl LaunchPlan {
    /// Default log directory under the OS temp path
    pub fn default_log_dir() -> PathBuf {
        std::env::temp_dir().join("chatstack")
    }
}

/// Orchestrates the three startup stages and owns the spawned children
pub struct Launcher {
    plan: LaunchPlan,
    services: Vec<ServiceProcess>,
    started: Vec<String>,
}

impl Launcher {
    /// Create a launcher for the given plan
    pub fn new(plan: LaunchPlan) -> Self {
        Self {
            plan,
            services: Vec::new(),
            started: Vec::new(),
        }
    }

    /// Names of the services actually spawned, in launch order
    pub fn started_services(&self) -> &[String] {
        &self.started
    }

    /// Run the full startup sequence.
    ///
    /// On failure every spawned child is best-effort terminated and the
    /// first error is returned; the frontend is spawned only after the
    /// backend has passed both its health check and the connectivity probe.
    pub async fn run(&mut self) -> Result<()> {
        match self.run_stages().await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.dump_logs();
                self.teardown();
                Err(err)
            }
        }
    }

    async fn run_stages(&mut self) -> Result<()> {
        let poller = self.poller();

        // Stage 1: model server
        let ollama = self.ollama_client();
        if ollama.server_ready().await {
            self.status("ollama", "already running, reusing it");
        } else {
            let command = self.plan.commands.ollama.clone();
            self.spawn_service("ollama", &command)?;
        }
        poller
            .wait_until_ready(&ollama.tags_url(), "ollama")
            .await?;
        self.status("ollama", "ready");

        match ollama.ensure_model(&self.plan.model).await? {
            EnsureOutcome::AlreadyPresent => {
                self.status("ollama", &format!("model {} present", self.plan.model));
            }
            EnsureOutcome::Pulled => {
                self.status("ollama", &format!("model {} pulled", self.plan.model));
            }
        }

        // Stage 2: backend
        let backend = BackendProbe::new(&self.plan.backend_url);
        let command = self.plan.commands.backend.clone();
        self.spawn_service("backend", &command)?;
        poller
            .wait_until_ready(&backend.health_url(), "backend")
            .await?;
        self.status("backend", "healthy");

        backend.verify_connectivity(&self.plan.probe_url).await?;
        self.status("backend", "connectivity verified");

        // Stage 3: frontend, only reachable once the backend is healthy
        let command = self.plan.commands.frontend.clone();
        self.spawn_service("frontend", &command)?;
        self.status(
            "frontend",
            &format!("started on port {}", self.plan.frontend_port),
        );

        Ok(())
    }

    /// Wait for the frontend child to exit and return its status.
    ///
    /// The frontend is the foreground process of the stack; the background
    /// services stay detached.
    pub async fn wait_for_frontend(&mut self) -> Option<Result<ExitStatus>> {
        let frontend = self.services.iter_mut().find(|s| s.name() == "frontend")?;
        Some(frontend.wait().await)
    }

    /// Best-effort kill of every spawned child, failures ignored
    pub fn teardown(&mut self) {
        for service in self.services.iter_mut().rev() {
            service.terminate();
        }
    }

    fn spawn_service(&mut self, name: &str, command: &str) -> Result<()> {
        let env = self.child_env();
        let process = ServiceProcess::spawn(name, command, &env, &self.plan.log_dir)?;
        let pid = process.id().map(|id| id.to_string()).unwrap_or_default();
        self.status(
            name,
            &format!("spawned (pid {}, log {})", pid, process.log_path().display()),
        );

        self.services.push(process);
        self.started.push(name.to_string());
        Ok(())
    }

    /// Configuration exported to every child process
    fn child_env(&self) -> Vec<(&'static str, String)> {
        vec![
            ("OLLAMA_HOST", self.plan.ollama_host.clone()),
            ("MODEL_NAME", self.plan.model.clone()),
            ("BACKEND_PORT", self.plan.backend_port.to_string()),
            (
                "STREAMLIT_SERVER_PORT",
                self.plan.frontend_port.to_string(),
            ),
            ("STREAMLIT_BASE_URL_PATH", self.plan.base_path.clone()),
        ]
    }

    fn poller(&self) -> ReadinessPoller {
        let poller = ReadinessPoller::new(self.plan.retries, self.plan.poll_interval);
        if self.plan.quiet {
            poller.silent()
        } else {
            poller
        }
    }

    fn ollama_client(&self) -> OllamaClient {
        let client = OllamaClient::new(&self.plan.ollama_host);
        if self.plan.quiet {
            client.silent()
        } else {
            client
        }
    }

    fn status(&self, service: &str, message: &str) {
        if !self.plan.quiet {
            println!("{} {} {}", "✓".green(), service.bold(), message);
        }
    }

    /// Print the log tails of everything spawned so far
    fn dump_logs(&self) {
        if self.plan.quiet {
            return;
        }
        for service in &self.services {
            let tail = service.log_tail(LOG_TAIL_LINES);
            if tail.is_empty() {
                continue;
            }
            eprintln!(
                "{} last output from {} ({}):",
                "✗".red(),
                service.name().bold(),
                service.log_path().display()
            );
            eprintln!("{}", tail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> LaunchPlan {
        LaunchPlan {
            model: "qwen2.5:0.5b".to_string(),
            ollama_host: "http://127.0.0.1:11434".to_string(),
            backend_url: "http://127.0.0.1:5002".to_string(),
            backend_port: 5002,
            frontend_port: 8501,
            base_path: String::new(),
            probe_url: "https://www.csusb.edu".to_string(),
            retries: 30,
            poll_interval: Duration::from_secs(1),
            log_dir: LaunchPlan::default_log_dir(),
            commands: ServicesConfig::default(),
            quiet: true,
        }
    }

    #[test]
    fn test_child_env_covers_all_knobs() {
        let launcher = Launcher::new(plan());
        let env = launcher.child_env();

        let keys: Vec<&str> = env.iter().map(|(k, _)| *k).collect();
        assert!(keys.contains(&"OLLAMA_HOST"));
        assert!(keys.contains(&"MODEL_NAME"));
        assert!(keys.contains(&"BACKEND_PORT"));
        assert!(keys.contains(&"STREAMLIT_SERVER_PORT"));
        assert!(keys.contains(&"STREAMLIT_BASE_URL_PATH"));
    }

    #[test]
    fn test_default_log_dir_is_under_temp() {
        let dir = LaunchPlan::default_log_dir();
        assert!(dir.starts_with(std::env::temp_dir()));
        assert!(dir.ends_with("chatstack"));
    }

    #[test]
    fn test_no_services_started_initially() {
        let launcher = Launcher::new(plan());
        assert!(launcher.started_services().is_empty());
    }
}
