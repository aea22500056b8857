//! Fetch engine facade.
//!
//! [`FetchEngine`] is the caller-visible handle. Constructing one starts a
//! dedicated scheduler thread with its own Tokio runtime; the caller and the
//! engine share nothing but two unbounded queues, a stop flag and a block of
//! atomic counters.
//!
//! # Concurrency Model
//!
//! - `submit`, `has_result` and `poll_result` never block
//! - `shutdown` blocks until the scheduler thread has drained and exited
//! - Results are emitted in completion order, not submission order
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use fetch_engine::{EngineConfig, FetchEngine, FetchRequest};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = FetchEngine::new(EngineConfig::default())?;
//! engine.submit(FetchRequest::new("https://example.com/", 3)?)?;
//!
//! let result = loop {
//!     if let Some(result) = engine.poll_result() {
//!         break result;
//!     }
//!     std::thread::sleep(Duration::from_millis(10));
//! };
//! println!("{} -> {}", result.request().url(), result.outcome());
//!
//! engine.shutdown()?;
//! # Ok(())
//! # }
//! ```

mod config;
mod executor;
pub mod queue;
mod scheduler;
mod stats;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use tracing::{debug, info, instrument, warn};

pub use config::{EngineConfig, default_pool_size};
pub use stats::{EngineStats, StatsSnapshot};

use self::executor::FetchExecutor;
use self::queue::{QueueReceiver, QueueSender};
use self::scheduler::Scheduler;
use crate::fetch::{EngineError, FetchRequest, FetchResult, HttpTransport, Transport};
use crate::user_agent::{RandomUserAgent, UserAgentSource};

/// Name of the isolated scheduler thread.
const SCHEDULER_THREAD_NAME: &str = "fetch-engine-scheduler";

/// Name prefix of the engine runtime's worker threads.
const WORKER_THREAD_NAME: &str = "fetch-engine-worker";

/// Handle to a running fetch engine.
///
/// Dropping a running engine performs the same drain as [`shutdown`](Self::shutdown).
pub struct FetchEngine {
    requests: Option<QueueSender<FetchRequest>>,
    results: QueueReceiver<FetchResult>,
    stop: Arc<AtomicBool>,
    stats: Arc<EngineStats>,
    pool_size: usize,
    scheduler: Option<JoinHandle<()>>,
}

impl FetchEngine {
    /// Starts an engine with the reqwest transport and rotating browser
    /// User-Agents.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] if `config` is invalid, or
    /// [`EngineError::Spawn`] if the scheduler thread cannot be started.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let transport =
            HttpTransport::new().fail_on_error_status(config.fail_on_error_status());
        Self::with_collaborators(config, Arc::new(transport), Arc::new(RandomUserAgent::new()))
    }

    /// Starts an engine with an injected transport and User-Agent source.
    ///
    /// The scheduler starts immediately, before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] if `config` is invalid, or
    /// [`EngineError::Spawn`] if the runtime or thread cannot be started.
    #[instrument(level = "debug", skip(transport, user_agents))]
    pub fn with_collaborators(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        user_agents: Arc<dyn UserAgentSource>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let (request_tx, request_rx) = queue::unbounded();
        let (result_tx, result_rx) = queue::unbounded();
        let stop = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(EngineStats::new());
        let pool_size = config.pool_size();

        let executor = FetchExecutor::new(
            pool_size,
            config.attempt_timeout(),
            transport,
            user_agents,
        );
        let scheduler = Scheduler::new(
            config,
            request_rx,
            request_tx.clone(),
            result_tx,
            Arc::clone(&stop),
            Arc::clone(&stats),
            executor,
        );

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name(WORKER_THREAD_NAME)
            .build()
            .map_err(EngineError::Spawn)?;

        let handle = std::thread::Builder::new()
            .name(SCHEDULER_THREAD_NAME.to_string())
            .spawn(move || runtime.block_on(scheduler.run()))
            .map_err(EngineError::Spawn)?;

        info!(pool_size, "fetch engine started");

        Ok(Self {
            requests: Some(request_tx),
            results: result_rx,
            stop,
            stats,
            pool_size,
            scheduler: Some(handle),
        })
    }

    /// Queues `request` for fetching. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EngineClosed`] after [`shutdown`](Self::shutdown).
    pub fn submit(&self, request: FetchRequest) -> Result<(), EngineError> {
        let requests = self.requests.as_ref().ok_or(EngineError::EngineClosed)?;
        let url = request.url().to_string();
        requests.put(request).map_err(|_| EngineError::EngineClosed)?;
        self.stats.increment_submitted();
        debug!(url = %url, "request submitted");
        Ok(())
    }

    /// Returns `true` if a result is probably waiting. May be stale.
    #[must_use]
    pub fn has_result(&self) -> bool {
        !self.results.is_empty()
    }

    /// Takes the next terminal result, or `None` if none is ready yet.
    ///
    /// Results already emitted stay pollable after shutdown.
    pub fn poll_result(&mut self) -> Option<FetchResult> {
        self.results.try_get()
    }

    /// Returns the configured worker count.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns a snapshot of the engine counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns `true` until [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Stops accepting requests, waits for queued and in-flight work to
    /// finish, and joins the scheduler thread.
    ///
    /// Calling this more than once is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SchedulerPanicked`] if the scheduler thread
    /// panicked.
    #[instrument(skip(self))]
    pub fn shutdown(&mut self) -> Result<(), EngineError> {
        let Some(handle) = self.scheduler.take() else {
            return Ok(());
        };

        self.requests = None;
        self.stop.store(true, Ordering::SeqCst);
        debug!("waiting for fetch scheduler to drain");

        handle.join().map_err(|_| EngineError::SchedulerPanicked)?;

        let stats = self.stats.snapshot();
        info!(
            submitted = stats.submitted,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "fetch engine shut down"
        );
        Ok(())
    }
}

impl Drop for FetchEngine {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "fetch engine did not shut down cleanly");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::user_agent::FixedUserAgent;

    fn offline_engine(pool_size: usize) -> FetchEngine {
        // Port 9 (discard) on localhost refuses connections quickly.
        let config = EngineConfig::default()
            .with_pool_size(pool_size)
            .with_attempt_timeout(Duration::from_millis(200))
            .with_backoff(Duration::from_millis(1), Duration::from_millis(5));
        FetchEngine::with_collaborators(
            config,
            Arc::new(HttpTransport::new()),
            Arc::new(FixedUserAgent::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = FetchEngine::new(EngineConfig::default().with_pool_size(0));
        assert!(matches!(result, Err(EngineError::InvalidArgument { .. })));
    }

    #[test]
    fn test_engine_starts_eagerly_and_shuts_down() {
        let mut engine = offline_engine(2);
        assert!(engine.is_running());
        assert_eq!(engine.pool_size(), 2);
        assert!(!engine.has_result());
        assert!(engine.poll_result().is_none());

        engine.shutdown().unwrap();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let mut engine = offline_engine(1);
        engine.shutdown().unwrap();

        let result = engine.submit(FetchRequest::new("http://127.0.0.1:9/", 1).unwrap());
        assert!(matches!(result, Err(EngineError::EngineClosed)));
        assert_eq!(engine.stats().submitted, 0);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut engine = offline_engine(1);
        engine.shutdown().unwrap();
        engine.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_drains_pending_requests() {
        let mut engine = offline_engine(1);
        for _ in 0..3 {
            engine
                .submit(FetchRequest::new("http://127.0.0.1:9/", 1).unwrap())
                .unwrap();
        }
        engine.shutdown().unwrap();

        let results: Vec<FetchResult> = std::iter::from_fn(|| engine.poll_result()).collect();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| !r.is_success()));
        assert_eq!(engine.stats().completed(), 3);
    }
}
