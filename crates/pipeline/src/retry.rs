//! Retry policy for render attempts.
//!
//! The policy is plain data -- attempt ceiling plus base delay -- so the
//! schedule is testable without timers. The orchestrator runs the actual
//! bounded loop and consults [`RetryPolicy::delay_after`] between
//! attempts.

use std::time::Duration;

use atelier_core::generation;

/// Bounded-retry parameters for one render task.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts (1 initial + retries).
    pub attempts: u32,
    /// Base delay; the wait after failed attempt `n` is `base * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: generation::DEFAULT_RENDER_ATTEMPTS,
            base_delay: generation::RETRY_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt `attempt` (1-based) before the
    /// next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        generation::retry_delay(self.base_delay, attempt)
    }

    /// Whether another attempt remains after `attempt` failures.
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.attempts
    }
}
