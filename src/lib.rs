//! chatstack - Local LLM chat stack launcher
//!
//! Brings up a three-service chat stack in strict sequence: the Ollama
//! model server, the backend API, and the web frontend. Each stage blocks
//! until its predecessor is confirmed ready over HTTP, or the whole
//! startup aborts with a non-zero exit.

pub mod backend;
pub mod cli;
pub mod config;
pub mod doctor;
pub mod errors;
pub mod launcher;
pub mod ollama;
pub mod poller;
pub mod process;

// Re-export commonly used types
pub use errors::{LaunchError, Result};
pub use launcher::{LaunchPlan, Launcher};
