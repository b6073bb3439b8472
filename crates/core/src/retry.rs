//! Retry policy and backoff schedule
//!
//! The policy only decides; sleeping and re-invoking the operation happens in
//! the shell crate.

use std::time::Duration;

use crate::error::SearchError;

/// How many times to attempt an operation and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_factor: 2,
        }
    }
}

impl RetryPolicy {
    /// Same attempt count with negligible delays, for tests
    pub fn immediate() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            backoff_factor: 2,
        }
    }

    /// Never retry
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.backoff_factor.saturating_pow(exponent);
        self.initial_delay.saturating_mul(factor)
    }

    /// Whether `error`, observed on the given attempt (1-based), warrants another try
    pub fn should_retry(&self, error: &SearchError, attempt: u32) -> bool {
        attempt < self.max_attempts && error.kind.is_transient()
    }
}

/// Which unit of work a transient failure restarts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryScope {
    /// Re-request only the page that failed
    PerPage,
    /// Restart the whole multi-page fetch from the first page
    WholeOperation,
}
