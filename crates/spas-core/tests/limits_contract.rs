//! Contract Test: Shared Limits
//!
//! Constraints verified:
//! - The rate limiter admits a burst of max_requests and delays the next one
//!   until the oldest request leaves the window
//! - Concurrent operations never exceed max_connections in flight
//! - Each client owns its limits; clients do not interfere

mod common;

use common::*;
use spas_core::SpasClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn burst_beyond_rate_limit_waits_for_window() {
    let transport = Arc::new(ScriptedTransport::new(Vec::new()));
    let config = minimal_config().with_rate_limit(3, 10);
    let client = client_over(&transport, &config);
    let start = Instant::now();

    for _ in 0..3 {
        client.search("Moscow").await.unwrap();
    }
    assert_eq!(start.elapsed(), Duration::ZERO, "first max_requests calls are immediate");

    client.search("Moscow").await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(10));
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn concurrent_operations_respect_pool_size() {
    let transport = Arc::new(ScriptedTransport::new(Vec::new()).with_latency(Duration::from_millis(50)));
    let config = minimal_config().with_max_connections(4);
    let client = client_over(&transport, &config);

    let mut handles = Vec::new();
    for i in 0..20 {
        let client = client.clone();
        handles.push(tokio::spawn(async move { client.search(format!("street {}", i)).await }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_some());
    }

    assert_eq!(transport.call_count(), 20);
    assert!(transport.peak_in_flight() <= 4);
    assert_eq!(transport.peak_in_flight(), 4, "pool should be fully used under load");
    assert_eq!(client.executor().pool().available(), 4);
}

#[tokio::test(start_paused = true)]
async fn clients_do_not_share_limits() {
    let transport = Arc::new(ScriptedTransport::new(Vec::new()));
    let config = minimal_config().with_rate_limit(1, 60);
    let first = client_over(&transport, &config);
    let second: SpasClient = client_over(&transport, &config);
    let start = Instant::now();

    first.search("Moscow").await.unwrap();
    second.search("Moscow").await.unwrap();

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(first.executor().limiter().in_window().await, 1);
    assert_eq!(second.executor().limiter().in_window().await, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_attempts_count_against_rate_limit() {
    let transport = Arc::new(ScriptedTransport::new(vec![Step::Network, Step::Network]));
    let config = minimal_config().with_rate_limit(2, 30);
    let client = client_over(&transport, &config);
    let start = Instant::now();

    client.search("Moscow").await.unwrap();

    // Third attempt has to wait for the first failed attempt to leave the window
    assert!(start.elapsed() >= Duration::from_secs(30));
    assert_eq!(transport.call_count(), 3);
}
