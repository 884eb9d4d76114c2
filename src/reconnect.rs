//! Reconnection policy
//!
//! When the transport drops without a deliberate `disconnect`, the client
//! consults the policy for the delay before the next attempt. The policy is
//! fixed-delay with a hard attempt cap: no backoff, no jitter. `None` means
//! the budget is exhausted and the client gives up.
//!
//! The attempt counter itself lives on the client and resets on every
//! successful open, so the cap applies per outage rather than per client
//! lifetime.

use std::time::Duration;

/// Fixed-delay, capped-attempt reconnection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
    max_retries: u32,
}

impl RetryPolicy {
    /// Create a policy with the given delay between attempts and attempt cap
    pub fn new(delay: Duration, max_retries: u32) -> Self {
        Self { delay, max_retries }
    }

    /// Returns the delay before the next attempt
    ///
    /// `attempt` is the number of reconnect attempts already made since the
    /// last successful open. Returns `None` once the cap is reached.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_retries).then_some(self.delay)
    }

    /// The configured delay between attempts
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The configured attempt cap
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
