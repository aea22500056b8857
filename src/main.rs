//! CLI entry point for the fetch engine.

use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fetch_engine::{
    DEFAULT_MAX_RETRIES, EngineConfig, FetchEngine, FetchRequest, FetchResult, FixedUserAgent,
    HttpTransport, RandomUserAgent, UserAgentSource,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

mod app_config;
mod cli;

use app_config::{FileConfig, UserAgentSetting};
use cli::Args;

/// How long the caller loop waits between empty polls.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded = app_config::load_config(args.config.as_deref())?;
    let file_config = loaded.config.unwrap_or_default();

    init_tracing(&args, &file_config);
    debug!(?args, config_path = ?loaded.path, "CLI arguments parsed");

    let input_text = if !args.urls.is_empty() {
        args.urls.join("\n")
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read URLs from stdin")?;
        buffer
    } else {
        info!("No input provided. Pipe URLs via stdin or pass as arguments.");
        info!("Example: echo 'https://example.com/' | fetch-engine");
        return Ok(ExitCode::SUCCESS);
    };

    let urls = parse_urls(&input_text);
    if urls.is_empty() {
        info!("No valid URLs found in input");
        return Ok(ExitCode::SUCCESS);
    }

    let engine_config = build_engine_config(&args, &file_config);
    let max_retries = args
        .max_retries
        .map(u32::from)
        .or(file_config.max_retries)
        .unwrap_or(DEFAULT_MAX_RETRIES);

    let transport =
        HttpTransport::new().fail_on_error_status(engine_config.fail_on_error_status());
    let user_agents = build_user_agents(&args, &file_config);

    let mut engine =
        FetchEngine::with_collaborators(engine_config, Arc::new(transport), user_agents)
            .context("Failed to start fetch engine")?;

    for url in &urls {
        engine.submit(FetchRequest::new(url.as_str(), max_retries)?)?;
    }
    info!(urls = urls.len(), pool_size = engine.pool_size(), max_retries, "Submitted URLs");

    let quiet =
        args.quiet || file_config.verbosity == Some(app_config::VerbositySetting::Quiet);
    let progress = progress_bar(urls.len(), quiet);
    let mut failed = 0usize;
    let mut received = 0usize;
    while received < urls.len() {
        let Some(result) = engine.poll_result() else {
            std::thread::sleep(POLL_INTERVAL);
            continue;
        };
        received += 1;
        if !result.is_success() {
            failed += 1;
        }
        let line = format_result(&result, args.json)?;
        progress.suspend(|| println!("{line}"));
        progress.inc(1);
    }
    progress.finish_and_clear();

    engine.shutdown()?;

    let stats = engine.stats();
    info!(
        succeeded = stats.succeeded,
        failed = stats.failed,
        attempts = stats.attempts,
        retried = stats.retried,
        "Fetch complete"
    );

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Installs the tracing subscriber on stderr.
///
/// Priority: `RUST_LOG` env var > quiet flag > verbose flag > config file > default (info)
fn init_tracing(args: &Args, file_config: &FileConfig) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => file_config
                .verbosity
                .map_or("info", app_config::VerbositySetting::filter_level),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Extracts one URL per line, skipping blanks and `#` comments.
///
/// Lines that are not absolute http(s) URLs are logged and skipped.
fn parse_urls(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match Url::parse(line) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(line.to_string()),
            _ => {
                warn!(input = %line, "Skipped unrecognized input");
                None
            }
        })
        .collect()
}

/// Merges CLI flags over file config over defaults.
fn build_engine_config(args: &Args, file_config: &FileConfig) -> EngineConfig {
    let mut config = EngineConfig::default();

    if let Some(pool_size) = args.pool_size.map(usize::from).or(file_config.pool_size) {
        config = config.with_pool_size(pool_size);
    }
    if let Some(timeout_ms) = args.timeout_ms.or(file_config.attempt_timeout_ms) {
        config = config.with_attempt_timeout(Duration::from_millis(timeout_ms));
    }
    if file_config.idle_backoff_ms.is_some() || file_config.max_backoff_ms.is_some() {
        let idle = file_config
            .idle_backoff_ms
            .map_or(config.idle_backoff(), Duration::from_millis);
        let max = file_config
            .max_backoff_ms
            .map_or(config.max_backoff(), Duration::from_millis);
        config = config.with_backoff(idle, max.max(idle));
    }

    let fail_on_error_status =
        args.fail_on_error_status || file_config.fail_on_error_status.unwrap_or(false);
    config.with_fail_on_error_status(fail_on_error_status)
}

fn build_user_agents(args: &Args, file_config: &FileConfig) -> Arc<dyn UserAgentSource> {
    if let Some(agent) = &args.user_agent {
        return Arc::new(FixedUserAgent::new(agent.clone()));
    }
    match &file_config.user_agent {
        Some(UserAgentSetting::Fixed(agent)) => Arc::new(FixedUserAgent::new(agent.clone())),
        Some(UserAgentSetting::Random) | None => Arc::new(RandomUserAgent::new()),
    }
}

fn progress_bar(total: usize, quiet: bool) -> ProgressBar {
    if quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_bar} {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// One result as printed with `--json`.
#[derive(Debug, Serialize)]
struct ResultLine<'a> {
    url: &'a str,
    outcome: &'a str,
    status: Option<u16>,
    bytes: Option<usize>,
    attempts: u32,
    error: Option<&'a str>,
}

impl<'a> From<&'a FetchResult> for ResultLine<'a> {
    fn from(result: &'a FetchResult) -> Self {
        let payload = result.payload();
        Self {
            url: result.request().url(),
            outcome: result.outcome().as_str(),
            status: payload.map(|p| p.status()),
            bytes: payload.map(|p| p.body().len()),
            attempts: result.request().attempts(),
            error: result.error(),
        }
    }
}

fn format_result(result: &FetchResult, json: bool) -> Result<String> {
    let line = ResultLine::from(result);
    if json {
        return serde_json::to_string(&line).context("Failed to serialize result");
    }
    Ok(match (line.status, line.bytes) {
        (Some(status), Some(bytes)) => format!(
            "OK\t{status}\t{bytes}\t{}\t{}",
            line.attempts, line.url
        ),
        _ => format!(
            "FAILED\t-\t-\t{}\t{}\t{}",
            line.attempts,
            line.url,
            line.error.unwrap_or("unknown error")
        ),
    })
}
