//! Constants for the fetch engine (timeouts, pool sizing, backoff).

use std::time::Duration;

/// Default per-attempt timeout (1 second).
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Workers started per available hardware thread.
pub const WORKERS_PER_THREAD: usize = 5;

/// Upper bound on the worker pool size.
pub const MAX_POOL_SIZE: usize = 1024;

/// Outstanding attempts allowed per worker (in flight plus lookahead).
pub const LOOKAHEAD_FACTOR: usize = 2;

/// Scheduler sleep when nothing is in flight.
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(5);

/// Scheduler sleep when every outstanding slot is taken.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_millis(100);

/// Connect timeout for the shared reqwest client.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
