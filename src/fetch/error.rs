//! Error types for the fetch engine.
//!
//! [`FetchError`] describes why a single attempt failed. It never crosses the
//! engine facade: the scheduler turns it into a retry or a failed
//! [`FetchResult`](super::FetchResult). [`EngineError`] is what callers see.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during a single fetch attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed to fetch.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Attempt did not complete within its timeout.
    #[error("timeout fetching {url} after {timeout_ms}ms")]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// HTTP error response, only produced when error statuses count as failures.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Transport-specific protocol failure reported by a custom transport.
    #[error("protocol error fetching {url}: {message}")]
    Protocol {
        /// The URL being fetched.
        url: String,
        /// Description supplied by the transport.
        message: String,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The server answered but sent no content.
    ///
    /// A blank 200 is how some sites soft-block scrapers, so it is retried
    /// exactly like a transport failure.
    #[error("empty response body from {url} (HTTP {status})")]
    EmptyBody {
        /// The URL that returned an empty body.
        url: String,
        /// The HTTP status code of the empty response.
        status: u16,
    },

    /// The worker task carrying this attempt panicked or was cancelled.
    #[error("fetch worker for {url} did not complete")]
    WorkerAborted {
        /// The URL the worker was fetching.
        url: String,
    },
}

/// Failure classes the scheduler distinguishes for logging.
///
/// Both classes share one recovery policy: retry while budget remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, connection, protocol or status failure.
    Transport,
    /// Transport succeeded but the body was empty.
    EmptyBody,
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    ///
    /// reqwest reports its own timeouts as errors; those are mapped to
    /// [`FetchError::Timeout`] so both timeout paths look the same.
    pub fn network(url: impl Into<String>, source: reqwest::Error, timeout: Duration) -> Self {
        if source.is_timeout() {
            return Self::timeout(url, timeout);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a protocol error.
    pub fn protocol(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an empty body error.
    pub fn empty_body(url: impl Into<String>, status: u16) -> Self {
        Self::EmptyBody {
            url: url.into(),
            status,
        }
    }

    /// Creates a worker-aborted error.
    pub fn worker_aborted(url: impl Into<String>) -> Self {
        Self::WorkerAborted { url: url.into() }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::EmptyBody { .. } => FailureKind::EmptyBody,
            _ => FailureKind::Transport,
        }
    }
}

/// Errors surfaced to callers of the engine facade.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A constructor or configuration value was out of range.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the rejected argument.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The engine has been shut down and no longer accepts requests.
    #[error("fetch engine is closed")]
    EngineClosed,

    /// The isolated scheduler thread or its runtime could not be started.
    #[error("failed to start fetch engine: {0}")]
    Spawn(#[source] std::io::Error),

    /// The scheduler thread panicked before draining.
    #[error("fetch scheduler panicked")]
    SchedulerPanicked,
}

impl EngineError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}
