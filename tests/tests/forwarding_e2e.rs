//! End-to-end tests through the real HTTP forwarder.
//!
//! Host request → tracked handler → Tracker → HttpForwarder → wiremock
//! ingestion endpoint.

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::fixtures::{self, LONDON_IP, TEST_USER_HEADER};
use integration_tests::setup::{ingestion_app, TEST_API_KEY};
use serde_json::{json, Value};
use telemetry::metrics;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INGEST_PATH: &str = "/2/httpapi";

async fn server_for(ingestion: &MockServer) -> TestServer {
    let app = ingestion_app(&format!("{}{}", ingestion.uri(), INGEST_PATH));
    TestServer::new(app).expect("Failed to create test server")
}

/// Exactly one POST per tracked action, in the ingestion API's shape.
#[tokio::test]
async fn test_event_is_posted_to_ingestion_endpoint() {
    let ingestion = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INGEST_PATH))
        .and(header("content-type", "application/json"))
        .and(header("accept", "*/*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200})))
        .expect(1)
        .mount(&ingestion)
        .await;

    let server = server_for(&ingestion).await;
    server
        .post("/paper")
        .add_header(TEST_USER_HEADER, "7")
        .add_header("x-forwarded-for", LONDON_IP)
        .json(&fixtures::paper_body("On Things"))
        .await
        .assert_status(StatusCode::CREATED);

    let requests = ingestion.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let hit: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(hit["api_key"], TEST_API_KEY);
    assert_eq!(hit["events"][0]["insert_id"], "paper_create_42");
    assert_eq!(hit["events"][0]["user_id"], "user: user7@example.org_7");
    assert_eq!(hit["events"][0]["city"], "London");
}

/// A 500 from the ingestion endpoint is logged, not retried, and the caller
/// sees the handler's own response.
#[tokio::test]
async fn test_ingestion_error_does_not_affect_response() {
    let ingestion = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&ingestion)
        .await;

    let server = server_for(&ingestion).await;
    let rejected_before = metrics().events_rejected.get();
    let response = server
        .post("/paper")
        .json(&fixtures::paper_body("On Things"))
        .await;

    response.assert_status(StatusCode::CREATED);
    response.assert_json(&json!({"id": 42, "title": "On Things"}));
    assert!(metrics().events_rejected.get() > rejected_before);
}

/// A slow endpoint is cut off by the forwarder timeout; the handler still
/// answers.
#[tokio::test]
async fn test_slow_ingestion_endpoint_times_out() {
    let ingestion = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&ingestion)
        .await;

    let config = forwarder::ForwarderConfig::new(
        format!("{}{}", ingestion.uri(), INGEST_PATH),
        TEST_API_KEY,
    )
    .with_timeout(Duration::from_millis(200));
    let forwarder = forwarder::HttpForwarder::new(&config).unwrap();
    let server = TestServer::new(integration_tests::setup::app(std::sync::Arc::new(forwarder))).unwrap();

    let started = std::time::Instant::now();
    server.get("/paper/42").await.assert_status_ok();
    assert!(started.elapsed() < Duration::from_secs(10));
}

/// Unreachable endpoint: connection refused is swallowed.
#[tokio::test]
async fn test_unreachable_ingestion_endpoint() {
    let server = TestServer::new(ingestion_app("http://127.0.0.1:9/2/httpapi")).unwrap();

    let response = server.get("/paper/42").await;
    response.assert_status_ok();
    response.assert_json(&json!({"id": 42, "title": "On Things"}));
}
