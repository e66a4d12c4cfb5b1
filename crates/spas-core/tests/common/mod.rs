//! Test doubles and common utilities for contract tests
//!
//! The scripted transport replays a fixed sequence of outcomes and records
//! every request it receives, so tests can assert on what reached the wire.

#![allow(dead_code)]

use serde_json::json;
use spas_core::error::{Error, Result};
use spas_core::{ApiRequest, Payload, RetryConfig, SpasClient, SpasConfig, Transport};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted transport outcome
#[derive(Debug, Clone)]
pub enum Step {
    /// Return this payload
    Reply(Payload),
    /// Fail with a connection error
    Network,
    /// Fail with this HTTP status
    Status(u16),
    /// Service reports no matching record
    NotFound,
    /// Never answer within any realistic timeout
    Hang,
}

/// A transport that replays scripted steps and records requests
pub struct ScriptedTransport {
    script: std::sync::Mutex<VecDeque<Step>>,
    /// Returned once the script is exhausted
    fallback: Payload,
    /// Time each answered call takes
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    requests: std::sync::Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
            fallback: address_payload(),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `payload`
    pub fn replying(payload: Payload) -> Self {
        let mut transport = Self::new(Vec::new());
        transport.fallback = payload;
        transport
    }

    /// Make every answered call take `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Get the number of times send() was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent send() calls observed
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Requests received, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Decrements the in-flight counter even when the call is cancelled
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Payload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        let step = self.script.lock().unwrap().pop_front();

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match step {
            None => Ok(self.fallback.clone()),
            Some(Step::Reply(payload)) => Ok(payload),
            Some(Step::Network) => Err(Error::network("connection refused")),
            Some(Step::Status(status)) => Err(Error::api(status, "scripted failure")),
            Some(Step::NotFound) => Err(Error::not_found("scripted: no such record")),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(self.fallback.clone())
            }
        }
    }

    fn transport_name(&self) -> &'static str {
        "scripted"
    }
}

/// A single-address lookup payload
pub fn address_payload() -> Payload {
    json!({
        "addresses": [{
            "object_id": 1460768,
            "object_guid": "9b3ee7b2-0dfa-4cb2-9d0b-9f4c3b7c1a11",
            "full_name": "г. Москва, ул. Тверская, д. 1",
            "region_code": 77
        }]
    })
}

/// Backoff of 100ms doubling, no jitter
pub fn deterministic_retry() -> RetryConfig {
    RetryConfig {
        base_delay_ms: 100,
        multiplier: 2.0,
        max_delay_ms: 5_000,
        jitter_ms: 0,
    }
}

/// Helper to create a minimal SpasConfig for testing
pub fn minimal_config() -> SpasConfig {
    SpasConfig::new()
        .with_token("test-token")
        .with_base_url("http://spas.invalid")
        .with_timeout_secs(5)
        .with_max_retries(3)
        .with_retry(deterministic_retry())
}

/// Client over a shared scripted transport
pub fn client_over(transport: &Arc<ScriptedTransport>, config: &SpasConfig) -> SpasClient {
    SpasClient::new(transport.clone(), config).expect("client construction succeeds")
}
