//! Backoff strategies.
//!
//! A strategy maps the index of the attempt that just failed (1-based) to
//! the pause before the next one.

use std::fmt::Debug;
use std::time::Duration;

use rand::Rng;

use crate::config::{BackoffKind, RetryConfig};

/// Delay generator consulted between attempts.
pub trait BackoffStrategy: Send + Sync + Debug {
    /// Delay to wait after `attempt` failed.
    fn delay(&self, attempt: u32) -> Duration;
}

/// `step * attempt`: 2s, 4s, 6s... with the default step.
#[derive(Debug, Clone, Copy)]
pub struct LinearBackoff {
    step: Duration,
}

impl LinearBackoff {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

impl BackoffStrategy for LinearBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt)
    }
}

/// Exponential backoff with up to 10% jitter, capped at `max_ms`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    base_ms: u64,
    max_ms: u64,
}

impl ExponentialBackoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_ms, self.max_ms)
    }
}

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Build the strategy selected in `[retries]`.
pub fn from_config(config: &RetryConfig) -> Box<dyn BackoffStrategy> {
    match config.strategy {
        BackoffKind::Linear => Box::new(LinearBackoff::new(Duration::from_millis(config.base_delay_ms))),
        BackoffKind::Exponential => Box::new(ExponentialBackoff::new(config.base_delay_ms, config.max_delay_ms)),
    }
}
