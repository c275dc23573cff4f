//! Fixed-delay retry policy.

use std::time::Duration;

use common::{PeerServicesConfig, ResilienceConfig};

/// How many times a call is attempted and how long each attempt may take.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per call, including the first one
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
    /// Upper bound on a single attempt
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            attempt_timeout,
        }
    }

    pub fn from_config(resilience: &ResilienceConfig, peers: &PeerServicesConfig) -> Self {
        Self::new(
            resilience.max_attempts,
            Duration::from_millis(resilience.retry_delay_ms),
            Duration::from_millis(peers.request_timeout_ms),
        )
    }

    /// Worst-case latency added by the retry loop.
    pub fn worst_case(&self) -> Duration {
        (self.attempt_timeout + self.delay) * self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ResilienceConfig::default(), &PeerServicesConfig::default())
    }
}
