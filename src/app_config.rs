//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// File-backed defaults for the fetch engine CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Number of concurrent workers (same range as CLI).
    pub pool_size: Option<usize>,
    /// Attempts per URL before giving up.
    pub max_retries: Option<u32>,
    /// Per-attempt timeout in milliseconds.
    pub attempt_timeout_ms: Option<u64>,
    /// Scheduler sleep when nothing is in flight, in milliseconds.
    pub idle_backoff_ms: Option<u64>,
    /// Scheduler sleep when the pool is saturated, in milliseconds.
    pub max_backoff_ms: Option<u64>,
    /// Treat HTTP 4xx/5xx responses as failed attempts.
    pub fail_on_error_status: Option<bool>,
    /// User-Agent strategy.
    pub user_agent: Option<UserAgentSetting>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(pool_size) = self.pool_size
            && !(1..=1024).contains(&pool_size)
        {
            bail!("Invalid config value for `pool_size`: {pool_size}. Expected range: 1..=1024");
        }

        if let Some(max_retries) = self.max_retries
            && !(1..=10).contains(&max_retries)
        {
            bail!("Invalid config value for `max_retries`: {max_retries}. Expected range: 1..=10");
        }

        if let Some(timeout) = self.attempt_timeout_ms
            && !(1..=600_000).contains(&timeout)
        {
            bail!(
                "Invalid config value for `attempt_timeout_ms`: {timeout}. Expected range: 1..=600000"
            );
        }

        if let (Some(idle), Some(max)) = (self.idle_backoff_ms, self.max_backoff_ms)
            && idle > max
        {
            bail!(
                "Invalid config value for `idle_backoff_ms`: {idle} exceeds `max_backoff_ms` ({max})"
            );
        }

        Ok(())
    }
}

/// How each attempt picks its User-Agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAgentSetting {
    /// Rotate through browser User-Agents.
    Random,
    /// Always send this string.
    Fixed(String),
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the tracing filter level for this setting.
    #[must_use]
    pub fn filter_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose | Self::Debug => "debug",
            Self::Quiet => "error",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/fetch-engine/config.toml`
/// 2. `$HOME/.config/fetch-engine/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("fetch-engine")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("fetch-engine")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from an explicit path, or from the default path if present.
///
/// An explicit path must exist; a missing default file is not an error.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;

        match key {
            "pool_size" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `pool_size` value on line {line_no}"))?;
                let n = usize::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("pool_size out of range for usize"))?;
                cfg.pool_size = Some(n);
            }
            "max_retries" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `max_retries` value on line {line_no}"))?;
                let n = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("max_retries out of range for u32"))?;
                cfg.max_retries = Some(n);
            }
            "attempt_timeout_ms" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `attempt_timeout_ms` value on line {line_no}")
                })?;
                cfg.attempt_timeout_ms = Some(parsed);
            }
            "idle_backoff_ms" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `idle_backoff_ms` value on line {line_no}")
                })?;
                cfg.idle_backoff_ms = Some(parsed);
            }
            "max_backoff_ms" => {
                let parsed = parse_integer_u64(value).with_context(|| {
                    format!("Invalid `max_backoff_ms` value on line {line_no}")
                })?;
                cfg.max_backoff_ms = Some(parsed);
            }
            "fail_on_error_status" => {
                let parsed = parse_boolean(value).with_context(|| {
                    format!("Invalid `fail_on_error_status` value on line {line_no}")
                })?;
                cfg.fail_on_error_status = Some(parsed);
            }
            "user_agent" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `user_agent` value on line {line_no}"))?;
                cfg.user_agent = Some(parse_user_agent(parsed).with_context(|| {
                    format!("Invalid `user_agent` value on line {line_no}")
                })?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `verbosity` value on line {line_no}"))?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}

fn parse_user_agent(value: String) -> Result<UserAgentSetting> {
    if value.trim().is_empty() {
        bail!("Expected \"random\" or a non-empty User-Agent string");
    }
    if value == "random" {
        Ok(UserAgentSetting::Random)
    } else {
        Ok(UserAgentSetting::Fixed(value))
    }
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
pool_size = 8
verbosity = "verbose"
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.pool_size, Some(8));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
        assert!(cfg.max_retries.is_none());
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
pool_size = 20
max_retries = 5
attempt_timeout_ms = 1500
idle_backoff_ms = 2
max_backoff_ms = 50
fail_on_error_status = true
user_agent = "random"
verbosity = "quiet"
"#,
        )
        .expect("full config should parse");
        assert_eq!(
            cfg,
            FileConfig {
                pool_size: Some(20),
                max_retries: Some(5),
                attempt_timeout_ms: Some(1500),
                idle_backoff_ms: Some(2),
                max_backoff_ms: Some(50),
                fail_on_error_status: Some(true),
                user_agent: Some(UserAgentSetting::Random),
                verbosity: Some(VerbositySetting::Quiet),
            }
        );
    }

    #[test]
    fn test_parse_config_fixed_user_agent() {
        let cfg = parse_config_str(r#"user_agent = "crawler/2.0 (+ops@example.com)""#)
            .expect("fixed user agent should parse");
        assert_eq!(
            cfg.user_agent,
            Some(UserAgentSetting::Fixed("crawler/2.0 (+ops@example.com)".into()))
        );
    }

    #[test]
    fn test_parse_config_rejects_empty_user_agent() {
        let err = parse_config_str(r#"user_agent = """#).expect_err("empty UA rejected");
        assert!(err.to_string().contains("user_agent"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_pool_size() {
        let err = parse_config_str("pool_size = 0").expect_err("invalid pool_size expected");
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn test_parse_config_rejects_zero_retries() {
        let err = parse_config_str("max_retries = 0").expect_err("zero retries rejected");
        assert!(err.to_string().contains("max_retries"));
    }

    #[test]
    fn test_parse_config_rejects_inverted_backoff() {
        let err = parse_config_str("idle_backoff_ms = 50\nmax_backoff_ms = 10")
            .expect_err("inverted backoff rejected");
        assert!(err.to_string().contains("idle_backoff_ms"));
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err =
            parse_config_str("pool_size = 4 trailing").expect_err("expected trailing token error");
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
pool_size = 4 # workers
user_agent = "bot # not a comment" # trailing comment
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.pool_size, Some(4));
        assert_eq!(
            cfg.user_agent,
            Some(UserAgentSetting::Fixed("bot # not a comment".into()))
        );
    }

    #[test]
    fn test_parse_config_rejects_invalid_boolean() {
        let err = parse_config_str("fail_on_error_status = yes").expect_err("invalid boolean");
        assert!(err.to_string().contains("fail_on_error_status"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("unknown_key = 123").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("unknown_key"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("pool_size 4").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_verbosity_filter_level() {
        assert_eq!(VerbositySetting::Default.filter_level(), "info");
        assert_eq!(VerbositySetting::Verbose.filter_level(), "debug");
        assert_eq!(VerbositySetting::Quiet.filter_level(), "error");
        assert_eq!(VerbositySetting::Debug.filter_level(), "debug");
    }

    #[test]
    fn test_load_config_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fetch.toml");
        fs::write(&path, "pool_size = 3\nmax_retries = 2\n").unwrap();

        let loaded = load_config(Some(&path)).expect("explicit config should load");
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        let cfg = loaded.config.unwrap();
        assert_eq!(cfg.pool_size, Some(3));
        assert_eq!(cfg.max_retries, Some(2));
    }

    #[test]
    fn test_load_config_missing_explicit_path_errors() {
        let temp = TempDir::new().unwrap();
        let err = load_config(Some(&temp.path().join("absent.toml")))
            .expect_err("missing explicit file is an error");
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
