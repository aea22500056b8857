//! Fetch Engine Library
//!
//! An asynchronous, retrying HTTP fetch engine. Callers submit
//! [`FetchRequest`]s and poll [`FetchResult`]s through a [`FetchEngine`]
//! handle; the scheduler that owns the worker pool runs on its own thread
//! and runtime, so submitting and polling never block the caller.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`engine`] - Engine facade, scheduler loop, queues and statistics
//! - [`fetch`] - Request/result model, transports, per-attempt logic
//! - [`user_agent`] - Per-attempt User-Agent sources
//!
//! ```text
//! caller ─submit─▶ RequestQueue ─▶ Scheduler ─▶ FetchExecutor (N workers)
//!    ▲                  ▲              │
//!    │                  └───retry──────┤
//!    └────poll──── ResultQueue ◀───────┘
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod fetch;
pub mod user_agent;

// Re-export commonly used types
pub use engine::{EngineConfig, EngineStats, FetchEngine, StatsSnapshot};
pub use fetch::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_MAX_RETRIES, EngineError, FailureKind, FetchError,
    FetchOutcome, FetchRequest, FetchResponse, FetchResult, HttpTransport, Transport,
};
pub use user_agent::{FixedUserAgent, RandomUserAgent, UserAgentSource, default_user_agent};
