//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch a list of URLs concurrently with per-request retries.
///
/// URLs are read from the positional arguments, or from stdin (one per
/// line) when none are given. Each URL produces exactly one result line on
/// stdout.
#[derive(Parser, Debug)]
#[command(name = "fetch-engine")]
#[command(author, version, about)]
pub struct Args {
    /// URLs to fetch (reads stdin when omitted)
    pub urls: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of concurrent workers (1-1024, default: hardware threads x 5)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u16).range(1..=1024))]
    pub pool_size: Option<u16>,

    /// Attempts per URL before giving up (1-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_retries: Option<u8>,

    /// Per-attempt timeout in milliseconds (1-600000)
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(1..=600_000))]
    pub timeout_ms: Option<u64>,

    /// Treat HTTP 4xx/5xx responses as failed attempts
    #[arg(long)]
    pub fail_on_error_status: bool,

    /// Send this User-Agent on every attempt instead of rotating browser strings
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Print one JSON object per result instead of tab-separated text
    #[arg(long)]
    pub json: bool,

    /// Read settings from this file instead of the default config location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
