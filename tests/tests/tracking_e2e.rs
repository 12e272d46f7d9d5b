//! End-to-end tests for the tracking middleware.
//!
//! Host request → tracked handler → Tracker → MockSink. The MockSink
//! implements the same EventSink trait as the HTTP forwarder, so everything
//! but the network transport runs as in production.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::fixtures::{self, LONDON_IP, TEST_USER_HEADER, UNKNOWN_IP};
use integration_tests::mocks::SinkMode;
use integration_tests::setup::{TestContext, TEST_API_KEY};
use serde_json::{json, Value};
use telemetry::metrics;

fn server(ctx: &TestContext) -> TestServer {
    TestServer::new(ctx.router.clone()).expect("Failed to create test server")
}

/// Authenticated create from a known public address produces one fully
/// enriched event.
#[tokio::test]
async fn test_authenticated_create_is_tracked_with_geo() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let response = server
        .post("/paper")
        .add_header(TEST_USER_HEADER, "7")
        .add_header("x-forwarded-for", LONDON_IP)
        .json(&fixtures::paper_body("On Things"))
        .await;

    response.assert_status(StatusCode::CREATED);
    response.assert_json(&json!({"id": 42, "title": "On Things"}));

    let hits = ctx.sink.hits();
    assert_eq!(hits.len(), 1, "exactly one hit per tracked action");
    assert_eq!(hits[0]["api_key"], TEST_API_KEY);
    assert_eq!(hits[0]["events"].as_array().unwrap().len(), 1);

    let event = &hits[0]["events"][0];
    assert_eq!(event["event_type"], "paper_create");
    assert_eq!(event["insert_id"], "paper_create_42");
    assert_eq!(event["user_id"], "user: user7@example.org_7");
    assert_eq!(event["event_properties"], json!({"id": 42, "title": "On Things"}));
    assert_eq!(event["user_properties"]["email"], "user7@example.org");
    assert_eq!(event["user_properties"]["invited_by_id"], 3);
    assert_eq!(event["user_properties"]["is_hub_editor"], true);
    assert_eq!(event["ip"], LONDON_IP);
    assert_eq!(event["country"], "United Kingdom");
    assert_eq!(event["city"], "London");
    assert_eq!(event["region"], "ENG");
    assert_eq!(event["dma"], Value::Null);
    assert_eq!(event["location_lat"], 51.5142);
    assert_eq!(event["location_lng"], -0.0931);
}

/// Anonymous request from a private address: placeholder identity, no geo.
#[tokio::test]
async fn test_anonymous_private_address_has_no_geo() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    server
        .post("/paper")
        .add_header("x-forwarded-for", "10.1.2.3")
        .json(&fixtures::paper_body("Anon"))
        .await
        .assert_status(StatusCode::CREATED);

    let events = ctx.captured_events();
    assert_eq!(events.len(), 1);
    let event = events[0].as_object().unwrap();

    assert_eq!(event["user_id"], "_Anonymous_");
    assert_eq!(event["user_properties"]["first_name"], "Anonymous");
    assert_eq!(event["user_properties"]["last_name"], "Anonymous");
    assert_eq!(event["user_properties"]["email"], "");
    assert_eq!(event["user_properties"]["reputation"], 0);
    assert_eq!(event["user_properties"]["invited_by_id"], Value::Null);
    for key in ["ip", "country", "city", "region", "dma", "location_lat", "location_lng"] {
        assert!(!event.contains_key(key), "unexpected geo key {key}");
    }
}

/// A public address missing from the database is not an error.
#[tokio::test]
async fn test_unknown_address_omits_geo() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    server
        .post("/paper")
        .add_header("x-forwarded-for", UNKNOWN_IP)
        .json(&fixtures::paper_body("Elsewhere"))
        .await
        .assert_status(StatusCode::CREATED);

    let events = ctx.captured_events();
    assert_eq!(events.len(), 1);
    assert!(events[0].get("country").is_none());
}

/// The first public hop of a proxy chain is used for geo.
#[tokio::test]
async fn test_proxy_chain_skips_private_hops() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    server
        .post("/paper")
        .add_header("x-forwarded-for", format!("192.168.0.4, {LONDON_IP}, 10.0.0.1"))
        .json(&fixtures::paper_body("Proxied"))
        .await
        .assert_status(StatusCode::CREATED);

    assert_eq!(ctx.captured_events()[0]["ip"], LONDON_IP);
}

/// Handler errors are returned as-is and nothing is sent.
#[tokio::test]
async fn test_failed_handler_is_not_tracked() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let response = server.get("/paper/9").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(ctx.sink.hit_count(), 0);
}

/// Retrieval is tracked under its own action.
#[tokio::test]
async fn test_retrieve_is_tracked() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    server.get("/paper/42").await.assert_status_ok();

    let events = ctx.captured_events();
    assert_eq!(events[0]["event_type"], "paper_retrieve");
    assert_eq!(events[0]["insert_id"], "paper_retrieve_42");
}

/// Repeating the same action yields the same dedup key.
#[tokio::test]
async fn test_repeated_action_has_stable_insert_id() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    server.get("/paper/42").await.assert_status_ok();
    server.get("/paper/42").await.assert_status_ok();

    let events = ctx.captured_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["insert_id"], events[1]["insert_id"]);
}

/// A payload without `id` is not tracked, and the caller still gets it.
#[tokio::test]
async fn test_payload_without_id_is_not_sent() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let response = server.delete("/paper/42").await;

    response.assert_status_ok();
    response.assert_json(&json!({"deleted": true}));
    assert_eq!(ctx.sink.hit_count(), 0);
}

/// Ingestion rejections and outages never reach the caller.
#[tokio::test]
async fn test_ingestion_failures_are_invisible_to_caller() {
    let ctx = TestContext::new();
    let server = server(&ctx);
    let rejected_before = metrics().events_rejected.get();
    let failures_before = metrics().delivery_failures.get();

    for mode in [SinkMode::Status(500), SinkMode::Status(400), SinkMode::Unreachable] {
        ctx.sink.set_mode(mode);
        let response = server.get("/paper/42").await;
        response.assert_status_ok();
        response.assert_json(&json!({"id": 42, "title": "On Things"}));
    }

    assert_eq!(ctx.sink.hit_count(), 3);
    assert!(metrics().events_rejected.get() >= rejected_before + 2);
    assert!(metrics().delivery_failures.get() > failures_before);
}

/// Routes that are not tracked pass straight through.
#[tokio::test]
async fn test_untracked_route_is_ignored() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    server.get("/untracked").await.assert_status_ok();
    assert_eq!(ctx.sink.hit_count(), 0);

    ctx.clear_captured();
    assert!(ctx.captured_events().is_empty());
}
