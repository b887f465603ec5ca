use std::time::Duration;

/// Reconnect delay policy: exponential backoff with a hard attempt ceiling.
///
/// Attempt `k` (1-based) waits `base * 2^(k-1)`. Once `max_attempts`
/// consecutive failures have accumulated no further delay is produced and the
/// client falls back to offline queuing until someone calls `connect()`
/// again.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    max_attempts: u32,
}

impl Backoff {
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self { base, max_attempts }
    }

    /// Delay before attempt number `attempt` (1-based), or `None` once the
    /// attempt budget is exhausted.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        Some(self.base.saturating_mul(factor))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for Backoff {
    fn default() -> Self {
        use crate::types::constants::{BASE_RECONNECT_DELAY_MS, MAX_RECONNECT_ATTEMPTS};
        Self::new(
            Duration::from_millis(BASE_RECONNECT_DELAY_MS),
            MAX_RECONNECT_ATTEMPTS,
        )
    }
}
