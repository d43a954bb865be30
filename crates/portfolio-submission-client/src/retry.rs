use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

/// Exponent cap so the shift never overflows.
const MAX_BACKOFF_EXPONENT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub enabled: bool,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn enabled(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            enabled: true,
            max_attempts,
            base_delay_ms,
        }
    }

    /// Total attempts a single send may make.
    #[must_use]
    pub fn attempt_budget(&self) -> u32 {
        if self.enabled {
            self.max_attempts.max(1)
        } else {
            1
        }
    }
}

/// Delay before the attempt following `failed_attempt` (1-based).
pub trait Backoff: Send + Sync {
    fn delay_after(&self, failed_attempt: u32) -> Duration;
}

/// `base * 2^(attempt - 1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub base_delay_ms: u64,
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new(base_delay_ms: u64) -> Self {
        Self { base_delay_ms }
    }
}

impl Backoff for ExponentialBackoff {
    fn delay_after(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        let multiplier = 1_u64 << exponent;
        Duration::from_millis(self.base_delay_ms.saturating_mul(multiplier))
    }
}

/// Retries back to back; handy in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackoff;

impl Backoff for NoBackoff {
    fn delay_after(&self, _failed_attempt: u32) -> Duration {
        Duration::ZERO
    }
}
