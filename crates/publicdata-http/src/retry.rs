//! Retry schedule with doubled delays between attempts.

use std::time::Duration;

/// Default number of attempts for a fetch, including the first.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Retry schedule for fetch attempts.
///
/// The delay doubles after every failed attempt and is neither capped nor
/// jittered, so the schedule for the defaults is 1s then 2s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. A budget of zero
    /// performs no request at all.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy that performs a single attempt with no retries.
    #[must_use]
    pub const fn once() -> Self {
        Self {
            max_retries: 1,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }

    /// Policy with a custom attempt budget and the default initial delay.
    #[must_use]
    pub const fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }

    /// Delay to sleep after `completed` failed attempts.
    #[must_use]
    pub fn delay_for(&self, completed: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2_u32.saturating_pow(completed))
    }
}
