//! Bounded worker pool for fetch attempts.
//!
//! Every dispatched attempt runs in its own Tokio task, but only after
//! acquiring a semaphore permit, so at most `pool_size` network calls are
//! executing at once. Tasks waiting for a permit form the lookahead buffer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::fetch::worker;
use crate::fetch::{FetchError, FetchRequest, FetchResponse, Transport};
use crate::user_agent::UserAgentSource;

/// A request paired with its in-flight attempt.
#[derive(Debug)]
pub(crate) struct PendingCall {
    request: FetchRequest,
    handle: JoinHandle<Result<FetchResponse, FetchError>>,
}

impl PendingCall {
    /// Returns `true` once the attempt has finished and can be harvested
    /// without waiting.
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Takes the request back together with the attempt's outcome.
    ///
    /// A worker that panicked or was cancelled yields
    /// [`FetchError::WorkerAborted`] so the request is still accounted for.
    pub(crate) async fn harvest(self) -> (FetchRequest, Result<FetchResponse, FetchError>) {
        let outcome = match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(url = %self.request.url(), error = %e, "fetch worker aborted");
                Err(FetchError::worker_aborted(self.request.url()))
            }
        };
        (self.request, outcome)
    }
}

/// Fixed-size pool executing fetch attempts.
pub(crate) struct FetchExecutor {
    permits: Arc<Semaphore>,
    pool_size: usize,
    attempt_timeout: Duration,
    transport: Arc<dyn Transport>,
    user_agents: Arc<dyn UserAgentSource>,
}

impl FetchExecutor {
    pub(crate) fn new(
        pool_size: usize,
        attempt_timeout: Duration,
        transport: Arc<dyn Transport>,
        user_agents: Arc<dyn UserAgentSource>,
    ) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(pool_size)),
            pool_size,
            attempt_timeout,
            transport,
            user_agents,
        }
    }

    /// Starts one attempt for `request` on the current runtime.
    ///
    /// Must be called from within the engine's runtime.
    pub(crate) fn dispatch(&self, request: FetchRequest) -> PendingCall {
        let permits = Arc::clone(&self.permits);
        let transport = Arc::clone(&self.transport);
        let user_agent = self.user_agents.random_string();
        let url = request.url().to_string();
        let timeout = self.attempt_timeout;

        let handle = tokio::spawn(async move {
            // Permit is dropped when this block exits (RAII)
            let Ok(_permit) = permits.acquire_owned().await else {
                return Err(FetchError::worker_aborted(url));
            };
            worker::attempt(transport.as_ref(), &user_agent, &url, timeout).await
        });

        PendingCall { request, handle }
    }

    /// Waits for every worker to become idle, then closes the pool.
    pub(crate) async fn drain(&self) {
        let all = u32::try_from(self.pool_size).unwrap_or(u32::MAX);
        match self.permits.acquire_many(all).await {
            Ok(permits) => {
                permits.forget();
                debug!(pool_size = self.pool_size, "executor drained");
            }
            Err(_) => debug!("executor already closed"),
        }
        self.permits.close();
    }
}
