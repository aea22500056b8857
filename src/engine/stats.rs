//! Engine counters shared between the scheduler and the caller.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Live counters updated by the scheduler thread.
///
/// Uses atomic counters so the caller can read them across the isolation
/// boundary without locking.
#[derive(Debug, Default)]
pub struct EngineStats {
    submitted: AtomicUsize,
    attempts: AtomicUsize,
    retried: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Requests accepted by `submit`.
    pub submitted: usize,
    /// Fetch attempts dispatched to the executor.
    pub attempts: usize,
    /// Failed attempts that were re-enqueued.
    pub retried: usize,
    /// Terminal successful results emitted.
    pub succeeded: usize,
    /// Terminal failed results emitted.
    pub failed: usize,
    /// Units in flight after the most recent intake.
    pub in_flight: usize,
    /// Highest in-flight count observed.
    pub peak_in_flight: usize,
}

impl StatsSnapshot {
    /// Returns the number of terminal results emitted.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl EngineStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::SeqCst),
            attempts: self.attempts.load(Ordering::SeqCst),
            retried: self.retried.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            in_flight: self.in_flight.load(Ordering::SeqCst),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
        }
    }

    pub(crate) fn increment_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_attempts(&self) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Records the current in-flight count and raises the peak if needed.
    pub(crate) fn observe_in_flight(&self, count: usize) {
        self.in_flight.store(count, Ordering::SeqCst);
        self.peak_in_flight.fetch_max(count, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_stats_default() {
        let snapshot = EngineStats::default().snapshot();
        assert_eq!(snapshot, StatsSnapshot::default());
        assert_eq!(snapshot.completed(), 0);
    }

    #[test]
    fn test_stats_increment() {
        let stats = EngineStats::new();
        stats.increment_submitted();
        stats.increment_attempts();
        stats.increment_attempts();
        stats.increment_retried();
        stats.increment_succeeded();
        stats.increment_failed();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.submitted, 1);
        assert_eq!(snapshot.attempts, 2);
        assert_eq!(snapshot.retried, 1);
        assert_eq!(snapshot.completed(), 2);
    }

    #[test]
    fn test_peak_in_flight_only_rises() {
        let stats = EngineStats::new();
        stats.observe_in_flight(3);
        stats.observe_in_flight(7);
        stats.observe_in_flight(2);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.in_flight, 2);
        assert_eq!(snapshot.peak_in_flight, 7);
    }

    #[test]
    fn test_stats_thread_safe() {
        use std::thread;

        let stats = Arc::new(EngineStats::new());
        let mut handles = Vec::new();

        for _ in 0..10 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    stats.increment_attempts();
                    stats.increment_succeeded();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.attempts, 1000);
        assert_eq!(snapshot.succeeded, 1000);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(StatsSnapshot::default()).unwrap();
        assert_eq!(json["peak_in_flight"], 0);
    }
}
