//! A single fetch attempt and its classification.

use std::time::Duration;

use tracing::{debug, instrument};

use super::error::FetchError;
use super::request::FetchResponse;
use super::transport::Transport;

/// Runs one attempt against `transport` and classifies the outcome.
///
/// - transport error or timeout → `Err`
/// - response with an empty body → `Err(FetchError::EmptyBody)`
/// - anything else → `Ok` with the response
///
/// The timeout is also enforced here, so a transport that ignores its
/// `timeout` argument still cannot hold a worker past the bound.
#[instrument(level = "debug", skip(transport, user_agent))]
pub(crate) async fn attempt(
    transport: &dyn Transport,
    user_agent: &str,
    url: &str,
    timeout: Duration,
) -> Result<FetchResponse, FetchError> {
    let response = tokio::time::timeout(timeout, transport.get(url, user_agent, timeout))
        .await
        .map_err(|_| FetchError::timeout(url, timeout))??;

    if response.body().is_empty() {
        debug!(status = response.status(), "empty body treated as failure");
        return Err(FetchError::empty_body(url, response.status()));
    }

    Ok(response)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct CannedTransport {
        status: u16,
        body: &'static str,
        delay: Duration,
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn get(
            &self,
            url: &str,
            _user_agent: &str,
            _timeout: Duration,
        ) -> Result<FetchResponse, FetchError> {
            tokio::time::sleep(self.delay).await;
            Ok(FetchResponse::new(url, self.status, self.body))
        }
    }

    struct RefusingTransport;

    #[async_trait]
    impl Transport for RefusingTransport {
        async fn get(
            &self,
            url: &str,
            _user_agent: &str,
            _timeout: Duration,
        ) -> Result<FetchResponse, FetchError> {
            Err(FetchError::protocol(url, "connection refused"))
        }
    }

    #[tokio::test]
    async fn test_non_empty_body_succeeds() {
        let transport = CannedTransport {
            status: 200,
            body: "<html></html>",
            delay: Duration::ZERO,
        };
        let response = attempt(&transport, "ua", "http://example.com", Duration::from_secs(1))
            .await
            .expect("non-empty body should succeed");
        assert_eq!(response.body(), "<html></html>");
    }

    #[tokio::test]
    async fn test_empty_body_fails() {
        let transport = CannedTransport {
            status: 200,
            body: "",
            delay: Duration::ZERO,
        };
        let result = attempt(&transport, "ua", "http://example.com", Duration::from_secs(1)).await;
        assert!(matches!(
            result,
            Err(FetchError::EmptyBody { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn test_error_status_with_body_is_not_a_failure() {
        let transport = CannedTransport {
            status: 404,
            body: "not found",
            delay: Duration::ZERO,
        };
        let response = attempt(&transport, "ua", "http://example.com", Duration::from_secs(1))
            .await
            .expect("status is left to the transport");
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_slow_transport_times_out() {
        let transport = CannedTransport {
            status: 200,
            body: "late",
            delay: Duration::from_secs(5),
        };
        let result = attempt(
            &transport,
            "ua",
            "http://example.com",
            Duration::from_millis(50),
        )
        .await;
        assert!(matches!(
            result,
            Err(FetchError::Timeout { timeout_ms: 50, .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_error_is_propagated() {
        let result = attempt(
            &RefusingTransport,
            "ua",
            "http://example.com",
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(FetchError::Protocol { .. })));
    }
}
