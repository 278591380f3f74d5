//! Retry policy.
//!
//! # Responsibilities
//! - Decide whether an attempt outcome warrants another attempt
//! - Cap the number of attempts per inbound call
//! - Supply the pause between attempts from a `BackoffStrategy`
//!
//! # Design Decisions
//! - 5xx responses and transport failures are retried
//! - Anything below 500 is final, including 4xx
//! - 429 is final unless `retry_rate_limited` is set

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;

use crate::config::RetryConfig;
use crate::proxy::outcome::AttemptOutcome;
use crate::resilience::backoff::{self, BackoffStrategy, LinearBackoff};

/// Attempt budget plus backoff schedule for one inbound call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Arc<dyn BackoffStrategy>,
    retry_rate_limited: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Arc<dyn BackoffStrategy>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            retry_rate_limited: false,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Arc::from(backoff::from_config(config)))
            .retry_rate_limited(config.retry_rate_limited)
    }

    pub fn retry_rate_limited(mut self, enabled: bool) -> Self {
        self.retry_rate_limited = enabled;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause after `attempt` (1-based) failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    pub fn should_retry(&self, outcome: &AttemptOutcome) -> bool {
        is_retryable(outcome.status(), self.retry_rate_limited)
    }
}

impl Default for RetryPolicy {
    /// Three attempts, 2s then 4s apart.
    fn default() -> Self {
        Self::new(3, Arc::new(LinearBackoff::default()))
    }
}

/// Check whether an attempt is worth retrying. `None` means no response
/// was obtained at all.
pub fn is_retryable(status: Option<StatusCode>, retry_rate_limited: bool) -> bool {
    match status {
        None => true,
        Some(status) if status.is_server_error() => true,
        Some(StatusCode::TOO_MANY_REQUESTS) => retry_rate_limited,
        _ => false,
    }
}
