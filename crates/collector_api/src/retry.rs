use std::time::Duration;

/// Total POST attempts before the uploader gives up.
pub const MAX_ATTEMPTS: u32 = 5;
/// Base of the exponential backoff.
pub const BACKOFF_FACTOR: u32 = 2;
/// Unit the backoff exponent is applied to.
pub const BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Bounded exponential backoff for collector uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            unit: BACKOFF_UNIT,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit,
        }
    }

    /// Wait after failed attempt `attempt` (1-indexed): `unit * 2^attempt`.
    ///
    /// `None` once `attempt` is the last one in the budget.
    #[must_use]
    pub fn delay_after_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let exponent = attempt.min(30);
        Some(self.unit.saturating_mul(BACKOFF_FACTOR.saturating_pow(exponent)))
    }

    /// Every wait the policy can schedule, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts).filter_map(|attempt| self.delay_after_attempt(attempt))
    }

    #[must_use]
    pub fn total_max_wait(&self) -> Duration {
        self.delays().sum()
    }
}

/// The collector acknowledges a stored session with exactly HTTP 200.
#[must_use]
pub fn is_accepted_status(status: u16) -> bool {
    status == 200
}
