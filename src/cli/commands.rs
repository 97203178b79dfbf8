//! CLI arguments and argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Stream a Steam inventory as JSON, one item per line
#[derive(Parser, Debug)]
#[command(name = "steam-inventory-stream")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 64-bit SteamID of the inventory owner
    pub steam_id: Option<String>,

    /// Application id (730 for CS2, 753 for Steam)
    #[arg(short, long)]
    pub app_id: Option<u32>,

    /// Context id within the application
    #[arg(short = 'x', long)]
    pub context_id: Option<String>,

    /// Language for item descriptions
    #[arg(short, long)]
    pub language: Option<String>,

    /// Failures at the minimum page size tolerated before giving up
    #[arg(long)]
    pub max_sequential_errors: Option<u32>,

    /// Largest page size to request
    #[arg(long)]
    pub max_page_size: Option<u32>,

    /// Clear the error counter after every successful page
    #[arg(long)]
    pub reset_errors_on_success: bool,

    /// Configuration file (JSON)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Inline config JSON, takes precedence over --config
    #[arg(long)]
    pub config_json: Option<String>,

    /// Base URL of the Steam community host
    #[arg(long)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Disable client-side rate limiting
    #[arg(long)]
    pub no_rate_limit: bool,

    /// Stop after this many items
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one item per line)
    Json,
    /// Indented JSON followed by a summary
    Pretty,
}
