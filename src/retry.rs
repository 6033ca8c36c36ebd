//! Retry classification and the backoff policy used between attempts.

use std::time::Duration;

use backoff::backoff::Backoff;
use rand::Rng as _;
use reqwest::StatusCode;

/// Whether a completed exchange should be attempted again.
///
/// Only `429 Too Many Requests` and server errors (`>= 500`) are retried. Every other status,
/// including the remaining `4xx`, is handed back to the caller.
#[must_use]
pub fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500
}

/// Uniform jitter inside a fixed `[min, max]` window, for at most `max_retries` waits.
///
/// The window does not grow with the attempt number. Once the budget is spent
/// [`Backoff::next_backoff`] returns `None`.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct LinearJitterBackoff {
    pub min: Duration,
    pub max: Duration,
    pub max_retries: u32,
    attempts: u32,
}

impl LinearJitterBackoff {
    #[must_use]
    pub fn new(min: Duration, max: Duration, max_retries: u32) -> Self {
        Self {
            min,
            max,
            max_retries,
            attempts: 0,
        }
    }

    /// Number of waits handed out since creation or the last reset.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Backoff for LinearJitterBackoff {
    fn reset(&mut self) {
        self.attempts = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_retries {
            return None;
        }
        self.attempts = self.attempts.saturating_add(1);

        if self.max <= self.min {
            return Some(self.min);
        }

        Some(rand::rng().random_range(self.min..=self.max))
    }
}
