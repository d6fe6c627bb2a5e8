//! Retry/backoff state machine for AI queries.
//!
//! ```text
//! Idle --start--> Attempting(1)
//! Attempting(n) --retryable failure, n < max--> Backoff(n) --resume--> Attempting(n+1)
//! Attempting(n) --success | terminal failure | n == max--> Terminal
//! ```
//!
//! Sleeping is delegated to a [`Sleeper`] so tests can observe backoff
//! without waiting.

use std::time::Duration;

use async_trait::async_trait;

/// Total attempts per query, first attempt included.
pub const MAX_ATTEMPTS: u32 = 5;

/// Base of the exponential backoff: retry `n` sleeps `base^n` seconds.
pub const BACKOFF_BASE: Duration = Duration::from_secs(2);

/// Fixed retry constants. Not user-configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_base: BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    /// Sleep before the retry that follows failed attempt `attempt` (1-based).
    ///
    /// `backoff_base^attempt`, measured in seconds.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        Duration::from_secs_f64(self.backoff_base.as_secs_f64().powi(exponent))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    Attempting(u32),
    Backoff(u32),
    Terminal,
}

/// Drives one query through [`RetryState`].
#[derive(Debug, Clone)]
pub struct RetryMachine {
    policy: RetryPolicy,
    state: RetryState,
    attempts: u32,
}

impl RetryMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: RetryState::Idle,
            attempts: 0,
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Begin the first attempt.
    pub fn start(&mut self) {
        if self.state == RetryState::Idle {
            self.state = RetryState::Attempting(1);
            self.attempts = 1;
        }
    }

    /// Record a failed attempt. Returns the backoff to sleep before retrying,
    /// or `None` when the machine is now terminal.
    pub fn on_failure(&mut self, retryable: bool) -> Option<Duration> {
        let RetryState::Attempting(n) = self.state else {
            self.state = RetryState::Terminal;
            return None;
        };
        if retryable && n < self.policy.max_attempts {
            self.state = RetryState::Backoff(n);
            Some(self.policy.backoff_for(n))
        } else {
            self.state = RetryState::Terminal;
            None
        }
    }

    /// Leave backoff and begin the next attempt.
    pub fn resume(&mut self) {
        if let RetryState::Backoff(n) = self.state {
            self.state = RetryState::Attempting(n + 1);
            self.attempts = n + 1;
        }
    }

    pub fn on_success(&mut self) {
        self.state = RetryState::Terminal;
    }

    pub fn is_terminal(&self) -> bool {
        self.state == RetryState::Terminal
    }

    /// Attempts made after the first one.
    pub fn retries_used(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Backoff sleep.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
