//! Fetch model and per-attempt logic.
//!
//! This module provides the values that travel through the engine and the
//! code that performs a single fetch attempt.
//!
//! # Features
//!
//! - [`FetchRequest`] with a per-request retry budget
//! - [`FetchResult`] / [`FetchOutcome`] for terminal outcomes
//! - [`Transport`] seam with a reqwest-backed [`HttpTransport`]
//! - Attempt classification: transport failures and empty bodies both fail
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use fetch_engine::fetch::{HttpTransport, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new();
//! let response = transport
//!     .get("https://example.com/", "fetch-engine/0.1.0", Duration::from_secs(1))
//!     .await?;
//! println!("HTTP {} ({} bytes)", response.status(), response.body().len());
//! # Ok(())
//! # }
//! ```

mod constants;
mod error;
mod request;
mod transport;
pub(crate) mod worker;

pub use constants::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_IDLE_BACKOFF, DEFAULT_MAX_BACKOFF, LOOKAHEAD_FACTOR,
    MAX_POOL_SIZE, WORKERS_PER_THREAD,
};
pub use error::{EngineError, FailureKind, FetchError};
pub use request::{
    DEFAULT_MAX_RETRIES, FetchOutcome, FetchRequest, FetchResponse, FetchResult,
};
pub use transport::{HttpTransport, Transport};
