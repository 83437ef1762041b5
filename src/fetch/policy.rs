//! Pacing and backoff policy for the retry controller

use crate::config::FetchConfig;
use rand::Rng;
use std::time::Duration;

/// Timing rules applied around every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Courtesy delay bounds, inclusive
    pub delay_min: Duration,
    pub delay_max: Duration,

    /// Attempts per request, first attempt included
    pub max_attempts: u32,

    /// Base wait after HTTP 429; the n-th attempt waits `n * rate_limit_wait`
    pub rate_limit_wait: Duration,

    /// Fixed wait after a transport error
    pub transport_error_wait: Duration,

    /// Timeout applied to every request
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            delay_min: Duration::from_millis(config.delay_min_ms),
            delay_max: Duration::from_millis(config.delay_max_ms),
            max_attempts: config.max_attempts.max(1),
            rate_limit_wait: Duration::from_millis(config.rate_limit_wait_ms),
            transport_error_wait: Duration::from_millis(config.transport_error_wait_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Draws a courtesy delay uniformly from the configured interval
    pub fn courtesy_delay(&self) -> Duration {
        if self.delay_max <= self.delay_min {
            return self.delay_min;
        }
        let min = self.delay_min.as_millis() as u64;
        let max = self.delay_max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    /// Backoff after a 429 on the given 1-based attempt
    pub fn rate_limit_backoff(&self, attempt: u32) -> Duration {
        self.rate_limit_wait.saturating_mul(attempt)
    }
}
