//! Engine configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::fetch::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_IDLE_BACKOFF, DEFAULT_MAX_BACKOFF, EngineError,
    LOOKAHEAD_FACTOR, MAX_POOL_SIZE, WORKERS_PER_THREAD,
};

/// Returns the default worker count: available hardware threads × 5.
#[must_use]
pub fn default_pool_size() -> usize {
    let threads = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    (threads * WORKERS_PER_THREAD).min(MAX_POOL_SIZE)
}

/// Tunables for a [`FetchEngine`](super::FetchEngine).
///
/// # Default Values
///
/// - `pool_size`: available hardware threads × 5 (capped at 1024)
/// - `attempt_timeout`: 1 second
/// - `idle_backoff`: 5 ms
/// - `max_backoff`: 100 ms
/// - `fail_on_error_status`: false
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pool_size: usize,
    attempt_timeout: Duration,
    idle_backoff: Duration,
    max_backoff: Duration,
    fail_on_error_status: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            fail_on_error_status: false,
        }
    }
}

impl EngineConfig {
    /// Sets the number of concurrent workers.
    #[must_use]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Sets the scheduler sleep bounds (nothing in flight / fully saturated).
    #[must_use]
    pub fn with_backoff(mut self, idle: Duration, max: Duration) -> Self {
        self.idle_backoff = idle;
        self.max_backoff = max;
        self
    }

    /// Makes 4xx/5xx responses count as failed attempts for the default transport.
    #[must_use]
    pub fn with_fail_on_error_status(mut self, enabled: bool) -> Self {
        self.fail_on_error_status = enabled;
        self
    }

    /// Returns the number of concurrent workers.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns the maximum number of outstanding attempts (2 × pool size).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool_size * LOOKAHEAD_FACTOR
    }

    /// Returns the per-attempt timeout.
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    /// Returns the scheduler sleep when nothing is in flight.
    #[must_use]
    pub fn idle_backoff(&self) -> Duration {
        self.idle_backoff
    }

    /// Returns the scheduler sleep when every outstanding slot is taken.
    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Returns whether error statuses are failures for the default transport.
    #[must_use]
    pub fn fail_on_error_status(&self) -> bool {
        self.fail_on_error_status
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidArgument`] if the pool size is outside
    /// `1..=1024`, the attempt timeout is zero, or the idle backoff exceeds
    /// the maximum backoff.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(1..=MAX_POOL_SIZE).contains(&self.pool_size) {
            return Err(EngineError::invalid_argument(
                "pool_size",
                format!(
                    "{} is out of range: must be between 1 and {MAX_POOL_SIZE}",
                    self.pool_size
                ),
            ));
        }
        if self.attempt_timeout.is_zero() {
            return Err(EngineError::invalid_argument(
                "attempt_timeout",
                "must be greater than zero",
            ));
        }
        if self.idle_backoff > self.max_backoff {
            return Err(EngineError::invalid_argument(
                "idle_backoff",
                format!(
                    "{:?} exceeds max_backoff {:?}",
                    self.idle_backoff, self.max_backoff
                ),
            ));
        }
        Ok(())
    }

    /// Scheduler sleep for the given in-flight count.
    ///
    /// Scales linearly from `idle_backoff` at zero to `max_backoff` at full
    /// capacity, and never exceeds `max_backoff`.
    #[must_use]
    pub fn backoff_for(&self, in_flight: usize) -> Duration {
        let capacity = self.capacity();
        if capacity == 0 || in_flight >= capacity {
            return self.max_backoff;
        }
        let span = self.max_backoff.saturating_sub(self.idle_backoff);
        let numerator = u32::try_from(in_flight).unwrap_or(u32::MAX);
        let denominator = u32::try_from(capacity).unwrap_or(u32::MAX);
        (self.idle_backoff + span.saturating_mul(numerator) / denominator).min(self.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_size_scales_with_parallelism() {
        let pool = default_pool_size();
        assert!(pool >= WORKERS_PER_THREAD);
        assert!(pool <= MAX_POOL_SIZE);
        assert_eq!(EngineConfig::default().pool_size(), pool);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.attempt_timeout(), Duration::from_secs(1));
        assert!(!config.fail_on_error_status());
    }

    #[test]
    fn test_capacity_is_twice_pool_size() {
        let config = EngineConfig::default().with_pool_size(4);
        assert_eq!(config.capacity(), 8);
    }

    #[test]
    fn test_validate_rejects_zero_pool() {
        let result = EngineConfig::default().with_pool_size(0).validate();
        assert!(matches!(
            result,
            Err(EngineError::InvalidArgument {
                name: "pool_size",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_pool() {
        let result = EngineConfig::default()
            .with_pool_size(MAX_POOL_SIZE + 1)
            .validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let result = EngineConfig::default()
            .with_attempt_timeout(Duration::ZERO)
            .validate();
        assert!(matches!(
            result,
            Err(EngineError::InvalidArgument {
                name: "attempt_timeout",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_backoff() {
        let result = EngineConfig::default()
            .with_backoff(Duration::from_millis(50), Duration::from_millis(10))
            .validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_backoff_scales_with_in_flight() {
        let config = EngineConfig::default()
            .with_pool_size(5)
            .with_backoff(Duration::from_millis(10), Duration::from_millis(110));

        assert_eq!(config.backoff_for(0), Duration::from_millis(10));
        assert_eq!(config.backoff_for(5), Duration::from_millis(60));
        assert_eq!(config.backoff_for(10), Duration::from_millis(110));
    }

    #[test]
    fn test_backoff_is_clamped() {
        let config = EngineConfig::default()
            .with_pool_size(1)
            .with_backoff(Duration::from_millis(1), Duration::from_millis(20));
        assert_eq!(config.backoff_for(1_000), Duration::from_millis(20));
    }
}
