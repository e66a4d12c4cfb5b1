//! HTTP transport against a local mock server
//!
//! Verifies what actually goes over the wire: paths, query parameters, bearer
//! authentication, and how response statuses reach the caller.

use serde_json::json;
use spas_core::{ApiRequest, AddressType, ErrorKind, RetryConfig, SpasConfig, Transport, classify};
use spas_transport_http::{HttpTransport, connect};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> SpasConfig {
    SpasConfig::new()
        .with_token("test-token")
        .with_base_url(server.uri())
        .with_timeout_secs(5)
        .with_retry(RetryConfig {
            base_delay_ms: 1,
            multiplier: 1.0,
            max_delay_ms: 1,
            jitter_ms: 0,
        })
}

#[tokio::test]
async fn lookup_by_id_sends_bearer_and_params() {
    let server = MockServer::start().await;
    let body = json!({"addresses": [{"object_id": 123456, "full_name": "г. Москва"}]});

    Mock::given(method("GET"))
        .and(path("/GetAddressItemById"))
        .and(query_param("object_id", "123456"))
        .and(query_param("address_type", "1"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config_for(&server)).unwrap();
    let payload = transport
        .send(&ApiRequest::lookup(&classify(123456), AddressType::Administrative))
        .await
        .unwrap();

    assert_eq!(payload, body);
}

#[tokio::test]
async fn hints_are_posted_as_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/GetAddressHint"))
        .and(body_json(json!({"search_string": "Москва, Тв", "address_type": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hints": [{"full_name": "г. Москва, ул. Тверская"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server).with_address_type(AddressType::Municipal);
    let client = connect(&config).unwrap();

    let hints = client.autocomplete_hints("Москва, Тв", 5).await.unwrap();

    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].full_name, "г. Москва, ул. Тверская");
}

#[tokio::test]
async fn not_found_status_is_a_negative_search_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/GetAddressItemByGuid"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such object"))
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&config_for(&server)).unwrap();
    let found = client.search("77000000-0000-0000-0000-000000000000").await.unwrap();

    assert_eq!(found, None);
}

#[tokio::test]
async fn server_errors_are_retried_up_to_the_ceiling() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/GetRegions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = connect(&config_for(&server)).unwrap();
    let err = client.get_regions().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.attempts(), Some(3));
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/SearchAddressItem"))
        .and(query_param("search_string", "Москва, Тверская 1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&config_for(&server)).unwrap();
    let err = client.search("Москва, Тверская 1").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.attempts(), Some(1));
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/GetDetails"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = connect(&config_for(&server)).unwrap();
    let err = client.get_details(1460768i64).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    // Port 1 is reserved and nothing listens on it
    let config = SpasConfig::new()
        .with_token("test-token")
        .with_base_url("http://127.0.0.1:1");
    let transport = HttpTransport::new(&config).unwrap();

    let err = transport.send(&ApiRequest::regions()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_retryable());
}
