//! Poll pacing: fixed or capped-exponential delays with jitter.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the delay between status polls evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Same interval between every poll.
    #[default]
    Fixed,
    /// Doubling interval, capped at the policy maximum.
    Exponential,
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

/// Pacing and bounds for waiting on a custody submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before the first poll and base for backoff.
    pub interval: Duration,
    /// Upper bound on any single delay.
    pub max_interval: Duration,
    pub strategy: BackoffStrategy,
    /// Consecutive failed polls tolerated before giving up on the wait.
    pub max_consecutive_failures: u32,
    /// Wall-clock budget for the whole local wait.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1_000),
            max_interval: Duration::from_millis(10_000),
            strategy: BackoffStrategy::Fixed,
            max_consecutive_failures: 3,
            timeout: Duration::from_millis(600_000),
        }
    }
}

impl PollPolicy {
    /// Delay before poll number `attempt` (1-based) when the previous poll succeeded.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => self.interval.min(self.max_interval),
            BackoffStrategy::Exponential => calculate_backoff(
                attempt.max(1),
                self.interval.as_millis() as u64,
                self.max_interval.as_millis() as u64,
            ),
        }
    }

    /// Delay before retrying after `failures` consecutive failed polls.
    pub fn retry_delay(&self, failures: u32) -> Duration {
        calculate_backoff(
            failures.saturating_add(1),
            self.interval.as_millis() as u64,
            self.max_interval.as_millis() as u64,
        )
    }
}
