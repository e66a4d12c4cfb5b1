//! Request executor
//!
//! The executor runs one logical operation against the remote service:
//! - Waits for the rate limiter
//! - Leases a pool slot for the duration of the call
//! - Sends the request through the [`Transport`] under a per-call timeout
//! - Retries transient failures according to the [`RetryPolicy`]
//!
//! ## Attempt Flow
//!
//! ```text
//!            ┌──────────────┐
//!   ┌───────▶│ RateLimiter  │  acquire (every attempt consumes a slot)
//!   │        └──────────────┘
//!   │               │
//!   │               ▼
//!   │        ┌──────────────┐
//!   │        │ConnectionPool│  lease, released when the attempt ends
//!   │        └──────────────┘
//!   │               │
//!   │               ▼
//!   │        ┌──────────────┐
//!   │        │  Transport   │  send, bounded by the call timeout
//!   │        └──────────────┘
//!   │               │
//!   │     ┌─────────┼──────────┐
//!   │     ▼         ▼          ▼
//!   │  Success   Retryable   Fatal ──▶ error
//!   │     │         │
//!   │     ▼         ▼
//!   │  payload   RetryPolicy ──(exhausted)──▶ last error
//!   │               │
//!   └──── backoff ◀─┘
//! ```
//!
//! An optional operation deadline bounds the whole loop. When it fires the
//! pending attempt is dropped (releasing its pool slot) and no further attempts
//! are made.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::SpasConfig;
use crate::error::{Error, Result};
use crate::limiter::RateLimiter;
use crate::pool::ConnectionPool;
use crate::request::{ApiRequest, Payload};
use crate::retry::{Attempt, AttemptOutcome, RetryPolicy, RetryState};
use crate::traits::Transport;

/// Result of a successful logical operation
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Decoded payload from the final attempt
    pub payload: Payload,
    /// Attempts made, including the successful one
    pub attempts: u32,
}

/// Runs logical operations with rate limiting, pooling and retry
///
/// ## Threading
///
/// One executor is shared by every operation of a client. The limiter and
/// pool are the only mutable shared state and both synchronize internally;
/// retry state lives on the stack of each `execute` call.
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    pool: Arc<ConnectionPool>,
    retry: RetryPolicy,
    call_timeout: Duration,
    operation_timeout: Option<Duration>,
}

impl RequestExecutor {
    /// Create an executor from client configuration
    ///
    /// # Parameters
    ///
    /// - `transport`: Transport implementation
    /// - `config`: Client configuration (limits, timeouts, backoff)
    pub fn new(transport: Arc<dyn Transport>, config: &SpasConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            transport,
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit_requests,
                config.rate_limit_window(),
            )),
            pool: Arc::new(ConnectionPool::new(config.max_connections)),
            retry: RetryPolicy::new(config.max_retries, &config.retry),
            call_timeout: config.timeout(),
            operation_timeout: config.operation_timeout(),
        })
    }

    /// Create an executor from already-built components
    pub fn from_parts(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        pool: Arc<ConnectionPool>,
        retry: RetryPolicy,
        call_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            limiter,
            pool,
            retry,
            call_timeout,
            operation_timeout: None,
        }
    }

    /// Bound every logical operation by an overall deadline
    pub fn with_operation_timeout(mut self, deadline: Duration) -> Self {
        self.operation_timeout = Some(deadline);
        self
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.transport_name()
    }

    /// Execute one logical operation, returning the payload
    pub async fn execute(&self, request: &ApiRequest) -> Result<Payload> {
        self.execute_traced(request)
            .await
            .map(|execution| execution.payload)
    }

    /// Execute one logical operation, returning the payload and attempt count
    ///
    /// # Returns
    ///
    /// - `Ok(Execution)`: First successful attempt
    /// - `Err(Error::Operation)`: Fatal failure, exhausted retries, or elapsed
    ///   operation deadline; the last observed failure is the source
    pub async fn execute_traced(&self, request: &ApiRequest) -> Result<Execution> {
        let mut state = RetryState::new();

        let Some(deadline) = self.operation_timeout else {
            return self.run_attempts(request, &mut state).await;
        };

        let outcome = tokio::time::timeout(deadline, self.run_attempts(request, &mut state)).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{} exceeded its {:?} deadline after {} attempt(s)",
                    request.operation, deadline, state.attempts_made
                );
                Err(
                    Error::deadline_exceeded(format!("operation deadline of {:?} elapsed", deadline))
                        .in_operation(request.operation, state.attempts_made),
                )
            }
        }
    }

    async fn run_attempts(&self, request: &ApiRequest, state: &mut RetryState) -> Result<Execution> {
        let operation = request.operation;

        loop {
            let number = state.begin_attempt();
            let attempt = self.attempt(request, number).await;

            match attempt.outcome {
                AttemptOutcome::Success(payload) => {
                    debug!("{} succeeded on attempt {}", operation, number);
                    return Ok(Execution {
                        payload,
                        attempts: number,
                    });
                }
                AttemptOutcome::FatalFailure(e) => {
                    debug!("{} failed permanently on attempt {}: {}", operation, number, e);
                    return Err(e.in_operation(operation, number));
                }
                AttemptOutcome::RetryableFailure(e) => {
                    if !self.retry.should_retry(number, &e) {
                        warn!(
                            "{} giving up after {} attempt(s): {}",
                            operation, number, e
                        );
                        return Err(e.in_operation(operation, number));
                    }

                    let delay = self.retry.delay_for(number);
                    state.next_delay = Some(delay);
                    warn!(
                        "{} attempt {} of {} failed: {} (retrying in {:?}, started {})",
                        operation,
                        number,
                        self.retry.max_attempts(),
                        e,
                        delay,
                        attempt.started_at
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Perform a single attempt
    ///
    /// The rate limiter slot is consumed before the pool is consulted, so
    /// attempts that fail still count against the limit.
    async fn attempt(&self, request: &ApiRequest, number: u32) -> Attempt {
        let started_at = Utc::now();

        self.limiter.acquire().await;

        let slot = match self.pool.lease().await {
            Ok(slot) => slot,
            Err(e) => {
                return Attempt {
                    number,
                    started_at,
                    outcome: AttemptOutcome::FatalFailure(e),
                };
            }
        };

        debug!(
            "{} attempt {} via {}",
            request.operation,
            number,
            self.transport.transport_name()
        );

        let result = match tokio::time::timeout(self.call_timeout, self.transport.send(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(format!(
                "no response within {:?}",
                self.call_timeout
            ))),
        };
        drop(slot);

        Attempt {
            number,
            started_at,
            outcome: AttemptOutcome::from_result(result),
        }
    }
}
