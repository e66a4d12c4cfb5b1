//! Retry policy and per-attempt bookkeeping

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::request::Payload;

/// Decides whether a failed attempt is retried and how long to wait
///
/// Stateless: the delay depends only on the attempt number and a jitter draw,
/// so one policy is shared by all operations of a client.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
    jitter: Duration,
}

impl RetryPolicy {
    /// Create a policy allowing `max_attempts` attempts, including the first
    pub fn new(max_attempts: u32, config: &RetryConfig) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            multiplier: config.multiplier.max(1.0),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether attempt `attempt_number` (1-based) may be followed by another
    pub fn should_retry(&self, attempt_number: u32, failure: &Error) -> bool {
        attempt_number < self.max_attempts && failure.is_retryable()
    }

    /// Delay to wait after attempt `attempt_number` failed
    ///
    /// `base * multiplier^(attempt_number - 1)` plus a random jitter, capped
    /// at the configured maximum.
    pub fn delay_for(&self, attempt_number: u32) -> Duration {
        let jitter = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            let millis = self.jitter.as_millis() as u64;
            Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
        };
        (self.backoff(attempt_number) + jitter).min(self.max_delay)
    }

    /// Delay without jitter
    pub fn backoff(&self, attempt_number: u32) -> Duration {
        let exponent = attempt_number.saturating_sub(1).min(32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

/// Outcome of a single attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(Payload),
    RetryableFailure(Error),
    FatalFailure(Error),
}

impl AttemptOutcome {
    /// Classify a transport result
    pub fn from_result(result: Result<Payload>) -> Self {
        match result {
            Ok(payload) => AttemptOutcome::Success(payload),
            Err(e) if e.is_retryable() => AttemptOutcome::RetryableFailure(e),
            Err(e) => AttemptOutcome::FatalFailure(e),
        }
    }
}

/// One attempt of a logical operation
#[derive(Debug)]
pub struct Attempt {
    /// 1-based attempt number
    pub number: u32,
    pub started_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
}

/// Retry progress of one logical operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    pub attempts_made: u32,
    /// Delay scheduled before the next attempt, if any
    pub next_delay: Option<Duration>,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of the attempt about to start
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts_made += 1;
        self.next_delay = None;
        self.attempts_made
    }
}
