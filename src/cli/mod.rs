//! Command-line interface for prompt-forge.
//!
//! Provides commands for creating, reverse-engineering, improving and
//! listing prompt packages.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
