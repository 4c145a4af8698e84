//! Bounded fixed-delay retry policy for hub connections
//!
//! Reconnection is deliberately not an unbounded loop with growing delays:
//! on a single-site LAN the hub is either there or it is not, so the
//! terminal tries a fixed number of times at a fixed interval and then
//! settles into offline mode.

use std::time::Duration;

use ol_core::config::RetryConfig;

/// Fixed-delay retry budget for connection attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts before giving up
    max_attempts: u32,
    /// Delay between attempts
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy from configuration
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.delay,
        }
    }

    /// Create a policy with explicit parameters
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Maximum number of attempts
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay between attempts
    pub fn delay(&self) -> Duration {
        self.delay
    }
}
