use std::time::Duration;

use rand::Rng;

use crate::clients::errors::FetchError;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);
const MAX_JITTER: Duration = Duration::from_millis(250);

/// Bounded retry with exponential backoff for transient fetch failures.
///
/// Delay before attempt `n + 1` is `min(base_delay * 2^(n - 1), max_delay)`
/// plus a random jitter of at most 250 ms.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            jitter: true,
        }
    }

    /// Same defaults, different attempt count (including the first request)
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// A single attempt, no retries
    #[must_use]
    pub fn none() -> Self {
        Self::with_max_attempts(1)
    }

    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait before the next attempt, or `None` when the failed
    /// `attempt` (1-indexed) must not be retried.
    #[must_use]
    pub fn next_delay(&self, error: &FetchError, attempt: u32) -> Option<Duration> {
        if !error.is_transient() || attempt >= self.max_attempts {
            return None;
        }
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay);
        Some(delay + self.jitter())
    }

    fn jitter(&self) -> Duration {
        if !self.jitter {
            return Duration::ZERO;
        }
        let max_ms = u64::try_from(MAX_JITTER.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }
}
