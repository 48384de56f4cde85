//! Reconnect policy
//!
//! Constant delay, unlimited attempts. No backoff or jitter is applied.

use std::time::Duration;

/// Delay used when none is configured
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// How long to wait after a lost connection before reconnecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    delay: Duration,
}

impl ReconnectPolicy {
    /// Retry forever after a fixed delay
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(delay_ms: u64) -> Self {
        Self::fixed(Duration::from_millis(delay_ms))
    }

    /// Delay before the next attempt
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}
