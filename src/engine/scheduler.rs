//! The scheduler loop that owns the worker pool.
//!
//! Each iteration runs four steps:
//!
//! 1. **Termination** - stop requested, request queue empty and nothing in
//!    flight: drain the executor and return.
//! 2. **Harvest** - collect finished attempts; failures with budget left go
//!    back on the request queue, everything else becomes a terminal result.
//! 3. **Intake** - dispatch queued requests until `2 × pool_size` attempts
//!    are outstanding.
//! 4. **Backoff** - sleep in proportion to how busy the pool is.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument, warn};

use super::config::EngineConfig;
use super::executor::{FetchExecutor, PendingCall};
use super::queue::{Closed, QueueReceiver, QueueSender};
use super::stats::EngineStats;
use crate::fetch::{FetchError, FetchRequest, FetchResponse, FetchResult};

/// Runs on the engine's isolated runtime until stopped and drained.
pub(crate) struct Scheduler {
    config: EngineConfig,
    requests: QueueReceiver<FetchRequest>,
    retries: QueueSender<FetchRequest>,
    results: QueueSender<FetchResult>,
    stop: Arc<AtomicBool>,
    stats: Arc<EngineStats>,
    executor: FetchExecutor,
    in_flight: Vec<PendingCall>,
}

impl Scheduler {
    pub(crate) fn new(
        config: EngineConfig,
        requests: QueueReceiver<FetchRequest>,
        retries: QueueSender<FetchRequest>,
        results: QueueSender<FetchResult>,
        stop: Arc<AtomicBool>,
        stats: Arc<EngineStats>,
        executor: FetchExecutor,
    ) -> Self {
        Self {
            config,
            requests,
            retries,
            results,
            stop,
            stats,
            executor,
            in_flight: Vec::new(),
        }
    }

    /// Runs the loop to completion.
    #[instrument(skip(self), fields(pool_size = self.config.pool_size()))]
    pub(crate) async fn run(mut self) {
        info!(
            capacity = self.config.capacity(),
            attempt_timeout_ms = self.config.attempt_timeout().as_millis(),
            "fetch scheduler started"
        );

        loop {
            if self.should_terminate() {
                self.executor.drain().await;
                break;
            }

            self.harvest().await;
            self.intake();

            let backoff = self.config.backoff_for(self.in_flight.len());
            tokio::time::sleep(backoff).await;
        }

        let stats = self.stats.snapshot();
        info!(
            attempts = stats.attempts,
            retried = stats.retried,
            succeeded = stats.succeeded,
            failed = stats.failed,
            peak_in_flight = stats.peak_in_flight,
            "fetch scheduler stopped"
        );
    }

    /// Stop requested AND nothing queued AND nothing in flight.
    fn should_terminate(&self) -> bool {
        self.stop.load(Ordering::SeqCst) && self.requests.is_empty() && self.in_flight.is_empty()
    }

    /// Settles every finished attempt; unfinished ones stay in flight.
    async fn harvest(&mut self) {
        let (finished, pending): (Vec<PendingCall>, Vec<PendingCall>) =
            std::mem::take(&mut self.in_flight)
                .into_iter()
                .partition(PendingCall::is_finished);
        self.in_flight = pending;

        for call in finished {
            let (request, outcome) = call.harvest().await;
            self.settle(request, outcome);
        }
    }

    fn settle(&self, mut request: FetchRequest, outcome: Result<FetchResponse, FetchError>) {
        match outcome {
            Ok(payload) => {
                debug!(
                    url = %request.url(),
                    attempts = request.attempts(),
                    status = payload.status(),
                    "fetch succeeded"
                );
                self.stats.increment_succeeded();
                self.emit(FetchResult::success(request, payload));
            }
            Err(error) => {
                if request.record_failure() {
                    debug!(
                        url = %request.url(),
                        attempt = request.attempts(),
                        retries_remaining = request.retries_remaining(),
                        kind = ?error.kind(),
                        error = %error,
                        "retrying fetch"
                    );
                    self.stats.increment_retried();
                    if let Err(Closed(request)) = self.retries.put(request) {
                        // The scheduler holds the receiving end, so this only
                        // happens while tearing down.
                        self.stats.increment_failed();
                        self.emit(FetchResult::failed(request, &error));
                    }
                } else {
                    warn!(
                        url = %request.url(),
                        attempts = request.attempts(),
                        error = %error,
                        "fetch failed after all attempts"
                    );
                    self.stats.increment_failed();
                    self.emit(FetchResult::failed(request, &error));
                }
            }
        }
    }

    fn emit(&self, result: FetchResult) {
        if let Err(Closed(result)) = self.results.put(result) {
            warn!(
                url = %result.request().url(),
                outcome = %result.outcome(),
                "result consumer is gone; dropping result"
            );
        }
    }

    /// Dispatches queued requests while outstanding work is below capacity.
    fn intake(&mut self) {
        let mut budget = self.config.capacity().saturating_sub(self.in_flight.len());
        while budget > 0 {
            let Some(mut request) = self.requests.try_get() else {
                break;
            };
            request.record_attempt();
            self.stats.increment_attempts();
            debug!(url = %request.url(), attempt = request.attempts(), "dispatching fetch");
            self.in_flight.push(self.executor.dispatch(request));
            budget -= 1;
        }
        self.stats.observe_in_flight(self.in_flight.len());
    }
}
