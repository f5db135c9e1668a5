//! Retry policy with linear backoff.

use std::time::Duration;

/// Default number of attempts per request (first try included).
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default backoff base.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// How many times a request is attempted and how long to wait in between.
///
/// The wait after attempt `n` is `n × base_delay`; nothing is waited before
/// the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `attempts` is clamped to at least one.
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// A single attempt, no retry.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay applied after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempt: 0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// Wait, then attempt again.
    Retry { after: Duration },
    /// Surface the error.
    GiveUp,
}

/// Per-request retry state machine.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryState {
    /// Record the start of an attempt; returns its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    /// Number of attempts started so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Decide the next step after the current attempt failed.
    pub fn on_failure(&self, retryable: bool) -> RetryStep {
        if !retryable || self.attempt >= self.policy.attempts {
            RetryStep::GiveUp
        } else {
            RetryStep::Retry {
                after: self.policy.delay_after(self.attempt),
            }
        }
    }
}
