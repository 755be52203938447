//! Detached service processes
//!
//! Managed services are fire-and-forget children: spawned argv-style (no
//! shell), stdout/stderr captured to a per-service log file, and observed
//! only via external HTTP polling. Teardown is a best-effort kill whose
//! failure is ignored.

use crate::config::split_command;
use crate::errors::{LaunchError, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};

/// A spawned background service with its captured log
#[derive(Debug)]
pub struct ServiceProcess {
    name: String,
    child: Child,
    log_path: PathBuf,
}

impl ServiceProcess {
    /// Spawn `command` detached as service `name`.
    ///
    /// `env` pairs are applied on top of the inherited environment; this is
    /// how port and host configuration reaches the children.
    pub fn spawn(
        name: &str,
        command: &str,
        env: &[(&str, String)],
        log_dir: &Path,
    ) -> Result<Self> {
        let (program, args) = split_command(command)?;

        fs::create_dir_all(log_dir)?;
        let log_path = log_dir.join(format!("{}.log", name));
        let stdout_log = File::create(&log_path)?;
        let stderr_log = stdout_log.try_clone()?;

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_log))
            .stderr(Stdio::from(stderr_log))
            .kill_on_drop(false);

        for (key, value) in env {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            service: name.to_string(),
            source,
        })?;

        Ok(Self {
            name: name.to_string(),
            child,
            log_path,
        })
    }

    /// Service name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the captured log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// OS process id, if the child has not already been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Best-effort kill; failures are silently ignored
    pub fn terminate(&mut self) {
        let _ = self.child.start_kill();
    }

    /// Check whether the child has already exited
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    /// Wait for the child to exit and return its status
    pub async fn wait(&mut self) -> Result<std::process::ExitStatus> {
        Ok(self.child.wait().await?)
    }

    /// Last `n` lines of the captured log, for fatal error reporting
    pub fn log_tail(&self, n: usize) -> String {
        let contents = fs::read_to_string(&self.log_path).unwrap_or_default();
        let lines: Vec<&str> = contents.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_spawn_captures_output() {
        let log_dir = TempDir::new().unwrap();

        let mut process =
            ServiceProcess::spawn("echo-test", "echo hello stack", &[], log_dir.path()).unwrap();

        let status = process.wait().await.unwrap();
        assert!(status.success());
        assert!(process.log_tail(10).contains("hello stack"));
    }

    #[tokio::test]
    async fn test_spawn_applies_env() {
        let log_dir = TempDir::new().unwrap();

        let mut process = ServiceProcess::spawn(
            "env-test",
            "env",
            &[("BACKEND_PORT", "5002".to_string())],
            log_dir.path(),
        )
        .unwrap();

        process.wait().await.unwrap();
        assert!(process.log_tail(200).contains("BACKEND_PORT=5002"));
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let log_dir = TempDir::new().unwrap();

        let result = ServiceProcess::spawn(
            "ghost",
            "definitely-not-a-real-binary-xyz",
            &[],
            log_dir.path(),
        );

        match result {
            Err(LaunchError::Spawn { service, .. }) => assert_eq!(service, "ghost"),
            other => panic!("expected spawn error, got {:?}", other.map(|p| p.name().to_string())),
        }
    }

    #[tokio::test]
    async fn test_terminate_running_child() {
        let log_dir = TempDir::new().unwrap();

        let mut process =
            ServiceProcess::spawn("sleeper", "sleep 30", &[], log_dir.path()).unwrap();
        assert!(!process.has_exited());

        process.terminate();
        let status = process.wait().await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let log_dir = TempDir::new().unwrap();

        let mut process = ServiceProcess::spawn("short", "true", &[], log_dir.path()).unwrap();
        process.wait().await.unwrap();

        // Killing an already-dead child must not panic or error out
        process.terminate();
        process.terminate();
    }

    #[tokio::test]
    async fn test_log_tail_limits_lines() {
        let log_dir = TempDir::new().unwrap();

        let mut process =
            ServiceProcess::spawn("seq-test", "seq 1 50", &[], log_dir.path()).unwrap();
        process.wait().await.unwrap();

        let tail = process.log_tail(3);
        assert_eq!(tail, "48\n49\n50");
    }
}
