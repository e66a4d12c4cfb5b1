//! Contract Test: Client Lifecycle
//!
//! Constraints verified:
//! - Operations after close fail immediately with a usage error
//! - No network I/O is attempted by a closed client
//! - Scoped use closes the client on normal return, error, and panic
//! - Closing wakes operations waiting for a pool slot

mod common;

use common::*;
use spas_core::{ClientState, ErrorKind};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn closed_client_rejects_every_operation_without_io() {
    let transport = Arc::new(ScriptedTransport::new(Vec::new()));
    let client = client_over(&transport, &minimal_config());

    client.close();

    assert_eq!(client.search("Moscow").await.unwrap_err().kind(), ErrorKind::Closed);
    assert_eq!(client.search(1).await.unwrap_err().kind(), ErrorKind::Closed);
    assert_eq!(client.autocomplete("Mo", 5).await.unwrap_err().kind(), ErrorKind::Closed);
    assert_eq!(client.get_details(1i64).await.unwrap_err().kind(), ErrorKind::Closed);
    assert_eq!(client.get_regions().await.unwrap_err().kind(), ErrorKind::Closed);

    assert_eq!(transport.call_count(), 0);
    assert_eq!(client.executor().limiter().in_window().await, 0);
}

#[tokio::test]
async fn scope_closes_client_on_normal_exit() {
    let transport = Arc::new(ScriptedTransport::new(Vec::new()));
    let client = client_over(&transport, &minimal_config());
    let handle = client.clone();

    let found = client
        .scope(|spas| async move { spas.search("Moscow, Tverskaya 1").await })
        .await
        .unwrap();

    assert!(found.is_some());
    assert_eq!(handle.state(), ClientState::Closed);
    assert_eq!(handle.search("Moscow").await.unwrap_err().kind(), ErrorKind::Closed);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn scope_closes_client_on_error_exit() {
    let transport = Arc::new(ScriptedTransport::new(vec![Step::Status(401)]));
    let client = client_over(&transport, &minimal_config());
    let handle = client.clone();

    let result = client
        .scope(|spas| async move { spas.search("Moscow").await })
        .await;

    assert!(result.is_err());
    assert!(handle.is_closed());
}

#[tokio::test]
async fn scope_closes_client_on_panic() {
    let transport = Arc::new(ScriptedTransport::new(Vec::new()));
    let client = client_over(&transport, &minimal_config());
    let handle = client.clone();

    let task = tokio::spawn(async move {
        client
            .scope(|_spas| async move {
                panic!("caller bug inside scope");
            })
            .await
    });

    assert!(task.await.is_err());
    assert!(handle.is_closed());
}

#[tokio::test]
async fn scope_closes_client_on_cancellation() {
    let transport = Arc::new(ScriptedTransport::new(vec![Step::Hang]));
    let client = client_over(&transport, &minimal_config());
    let handle = client.clone();

    let scoped = client.scope(|spas| async move { spas.search("Moscow").await });
    let outcome = tokio::time::timeout(Duration::from_millis(20), scoped).await;

    assert!(outcome.is_err(), "scope should still be waiting on the hung call");
    assert!(handle.is_closed());
    assert_eq!(handle.executor().pool().in_use(), 0);
}

#[tokio::test]
async fn close_wakes_operations_waiting_for_a_slot() {
    let transport = Arc::new(ScriptedTransport::new(vec![Step::Hang]));
    let config = minimal_config().with_max_connections(1);
    let client = client_over(&transport, &config);

    let busy = {
        let client = client.clone();
        tokio::spawn(async move { client.search("first").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let waiting = {
        let client = client.clone();
        tokio::spawn(async move { client.search("second").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    client.close();

    let err = tokio::time::timeout(Duration::from_secs(1), waiting)
        .await
        .expect("waiter wakes on close")
        .unwrap()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Closed);
    assert_eq!(transport.call_count(), 1);

    busy.abort();
}
