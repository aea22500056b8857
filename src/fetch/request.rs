//! Request, response and result types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{EngineError, FetchError};

/// Default retry budget (total attempts) for a request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A URL to fetch together with its remaining attempt budget.
///
/// Owned by the caller until submitted, then exclusively by the engine until
/// it comes back inside a [`FetchResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    url: String,
    retries_remaining: u32,
    attempts: u32,
}

impl FetchRequest {
    /// Creates a request with a retry budget of `retries` attempts.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] if `retries` is zero.
    pub fn new(url: impl Into<String>, retries: u32) -> Result<Self, EngineError> {
        if retries < 1 {
            return Err(EngineError::invalid_argument(
                "retries_remaining",
                format!("must be at least 1, got {retries}"),
            ));
        }
        Ok(Self {
            url: url.into(),
            retries_remaining: retries,
            attempts: 0,
        })
    }

    /// Creates a request with [`DEFAULT_MAX_RETRIES`].
    #[must_use]
    pub fn with_default_budget(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retries_remaining: DEFAULT_MAX_RETRIES,
            attempts: 0,
        }
    }

    /// Returns the URL to fetch.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the number of attempts this request may still make.
    #[must_use]
    pub fn retries_remaining(&self) -> u32 {
        self.retries_remaining
    }

    /// Returns the number of attempts dispatched so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Records that an attempt has been dispatched.
    pub(crate) fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Consumes one unit of budget after a failed attempt.
    ///
    /// Returns `true` while the request may be retried.
    pub(crate) fn record_failure(&mut self) -> bool {
        self.retries_remaining = self.retries_remaining.saturating_sub(1);
        self.retries_remaining > 0
    }
}

/// Terminal outcome of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// A non-empty response was received.
    Success,
    /// Every attempt in the budget failed.
    Failed,
}

impl FetchOutcome {
    /// Returns the stable string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw response returned by a [`Transport`](super::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    url: String,
    status: u16,
    body: String,
}

impl FetchResponse {
    /// Creates a response. `url` is the final URL after redirects.
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Returns the final URL after redirects.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the response body as text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Consumes the response, returning its body.
    #[must_use]
    pub fn into_body(self) -> String {
        self.body
    }
}

/// Terminal result for one submitted request.
///
/// `payload` is present iff `outcome` is [`FetchOutcome::Success`]; `error`
/// holds the last attempt's failure iff it is [`FetchOutcome::Failed`].
#[derive(Debug, Clone)]
pub struct FetchResult {
    request: FetchRequest,
    payload: Option<FetchResponse>,
    outcome: FetchOutcome,
    error: Option<String>,
}

impl FetchResult {
    pub(crate) fn success(request: FetchRequest, payload: FetchResponse) -> Self {
        Self {
            request,
            payload: Some(payload),
            outcome: FetchOutcome::Success,
            error: None,
        }
    }

    pub(crate) fn failed(request: FetchRequest, error: &FetchError) -> Self {
        Self {
            request,
            payload: None,
            outcome: FetchOutcome::Failed,
            error: Some(error.to_string()),
        }
    }

    /// Returns the request in its final state.
    #[must_use]
    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    /// Returns the response of the successful attempt.
    #[must_use]
    pub fn payload(&self) -> Option<&FetchResponse> {
        self.payload.as_ref()
    }

    /// Returns the terminal outcome.
    #[must_use]
    pub fn outcome(&self) -> FetchOutcome {
        self.outcome
    }

    /// Returns `true` if the request succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == FetchOutcome::Success
    }

    /// Returns the error message of the last failed attempt.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Splits the result into its request and payload.
    #[must_use]
    pub fn into_parts(self) -> (FetchRequest, Option<FetchResponse>) {
        (self.request, self.payload)
    }
}
