//! Reconnection policy and the sleeping abstraction it is driven by.
//!
//! The policy is pure so the delay sequence can be tested without timers;
//! the connection driver sleeps through an injected [`Sleeper`].

use std::time::Duration;

use async_trait::async_trait;

/// Exponent cap of the backoff growth.
const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Exponential backoff with a ceiling on delay and on attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before automatic attempt `attempt` (1-based):
    /// `min(initial * 2^min(attempt - 1, 5), max)`.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.initial_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay)
    }

    /// Check if another automatic attempt may be made after `attempts_made` attempts.
    pub fn should_attempt_reconnect(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

/// Something that can wait for a duration.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
