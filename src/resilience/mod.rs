//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt outcome from the orchestrator:
//!     → retries.rs (retryable? attempts left?)
//!     → backoff.rs (how long to wait before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Attempts are strictly sequential; no hedging
//! - Per-attempt timeouts live in the upstream client, not here
//! - The backoff schedule is a pluggable strategy

pub mod backoff;
pub mod retries;

pub use backoff::{BackoffStrategy, ExponentialBackoff, LinearBackoff};
pub use retries::RetryPolicy;
