//! Sliding-window rate limiter
//!
//! Bounds how many requests a client issues within any trailing window. Each
//! client owns its own limiter, so two clients never share a budget.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Sliding-window request counter
///
/// ## Thread Safety
///
/// The prune-check-record sequence runs under one async mutex, so concurrent
/// acquirers can never push the window above `max_requests`. Waiting happens
/// outside the lock: a caller sleeping for the window to drain does not hold up
/// callers that only need bookkeeping.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    /// Issue instants within the trailing window, oldest first
    issued: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per `window`
    ///
    /// A `max_requests` of zero is treated as one so that callers can never
    /// block forever.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            window,
            issued: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until a request may be issued, then record it
    ///
    /// Cancel-safe: dropping the future before it returns records nothing.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut issued = self.issued.lock().await;
                let now = Instant::now();
                self.prune(&mut issued, now);

                if issued.len() < self.max_requests {
                    issued.push_back(now);
                    return;
                }

                match issued.front() {
                    Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };

            debug!("Rate limit window full, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of requests recorded in the current window
    pub async fn in_window(&self) -> usize {
        let mut issued = self.issued.lock().await;
        self.prune(&mut issued, Instant::now());
        issued.len()
    }

    fn prune(&self, issued: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = issued.front() {
            if now.duration_since(*oldest) >= self.window {
                issued.pop_front();
            } else {
                break;
            }
        }
    }
}
