//! CLI module
//!
//! Command-line interface for streaming one inventory to stdout.

mod commands;
mod runner;

pub use commands::{Cli, OutputFormat};
pub use runner::Runner;
