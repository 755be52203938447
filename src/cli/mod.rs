//! Command-line interface module

pub mod args;

pub use args::{Args, Commands, Verbosity};
