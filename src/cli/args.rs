//! Command-line argument parsing for chatstack
//!
//! Every knob is a flag with an environment-variable fallback and a
//! hardcoded default, so the launcher can be driven entirely from the
//! environment the way the original deployment was.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// chatstack - Bring up a local Ollama + backend + Streamlit chat stack
#[derive(Parser, Debug)]
#[command(name = "chatstack")]
#[command(version = "0.3.0")]
#[command(about = "Start and health-check a local LLM chat stack", long_about = None)]
pub struct Args {
    /// Ollama model to ensure is available locally
    #[arg(short, long, env = "MODEL_NAME", default_value = "qwen2.5:0.5b")]
    pub model: String,

    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_HOST", default_value = "http://127.0.0.1:11434")]
    pub ollama_host: String,

    /// Port the backend API binds to
    #[arg(long, env = "BACKEND_PORT", default_value_t = 5002)]
    pub backend_port: u16,

    /// Port the frontend UI binds to
    #[arg(long, env = "STREAMLIT_SERVER_PORT", default_value_t = 8501)]
    pub frontend_port: u16,

    /// Base URL path the frontend serves under
    #[arg(long, env = "STREAMLIT_BASE_URL_PATH", default_value = "")]
    pub base_path: String,

    /// Readiness poll attempts per service (config file value if omitted)
    #[arg(long)]
    pub retries: Option<u32>,

    /// Seconds between readiness poll attempts (config file value if omitted)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// URL the synthetic backend connectivity probe asks the backend to fetch
    #[arg(long, env = "PROBE_URL", default_value = "https://www.csusb.edu")]
    pub probe_url: String,

    /// Directory for captured service logs (temp dir by default)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Verbosity level: default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the full stack (default when no subcommand is given)
    Up,

    /// Run health checks without starting anything
    Doctor,

    /// List models installed on the Ollama server
    Models,

    /// Display the resolved configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Backend base URL derived from the configured port
    pub fn backend_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.backend_port)
    }

    /// Frontend base URL derived from the configured port and base path
    pub fn frontend_url(&self) -> String {
        if self.base_path.is_empty() {
            format!("http://127.0.0.1:{}", self.frontend_port)
        } else {
            format!(
                "http://127.0.0.1:{}/{}",
                self.frontend_port,
                self.base_path.trim_matches('/')
            )
        }
    }
}

impl Verbosity {
    /// Check if progress spinners/bars should be shown
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if per-attempt poll details should be shown
    pub fn show_attempts(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
