//! Network transport seam and its reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use tracing::{debug, instrument};
use url::Url;

use super::constants::CONNECT_TIMEOUT;
use super::error::FetchError;
use super::request::FetchResponse;
use crate::user_agent;

/// Performs a single HTTP GET.
///
/// Implementations report every failure as a [`FetchError`]; they do not
/// retry. Any non-error response, whatever its status or body, is returned
/// as a [`FetchResponse`] and classified by the engine.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url` sending `user_agent`, giving up after `timeout`.
    async fn get(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<FetchResponse, FetchError>;
}

/// reqwest-backed [`Transport`].
///
/// This client is designed to be created once and shared by every worker,
/// taking advantage of connection pooling.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    fail_on_error_status: bool,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a transport with a short connect timeout and gzip enabled.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self::with_client(client)
    }

    /// Wraps an existing reqwest client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            fail_on_error_status: false,
        }
    }

    /// When enabled, 4xx/5xx responses are reported as
    /// [`FetchError::HttpStatus`] instead of being returned.
    #[must_use]
    pub fn fail_on_error_status(mut self, enabled: bool) -> Self {
        self.fail_on_error_status = enabled;
        self
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(level = "debug", skip(self, user_agent), fields(url = %url))]
    async fn get(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<FetchResponse, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self
            .client
            .get(parsed)
            .header(USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e, timeout))?;

        let status = response.status();
        if self.fail_on_error_status && (status.is_client_error() || status.is_server_error()) {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(url, e, timeout))?;

        debug!(status = status.as_u16(), bytes = body.len(), "response received");
        Ok(FetchResponse::new(final_url, status.as_u16(), body))
    }
}
