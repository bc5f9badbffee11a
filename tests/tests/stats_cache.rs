//! Cached analytics reads through GET /stats/{report}.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{mocks, setup::TestContext};
use serde_json::Value;
use std::time::Duration;

fn server(ctx: &TestContext) -> TestServer {
    TestServer::new(ctx.router.clone()).expect("Failed to create test server")
}

#[tokio::test]
async fn test_miss_then_hit_computes_once() {
    let ctx = TestContext::new();
    ctx.read_sink.set_report("top_paths", mocks::top_paths_rows());
    let server = server(&ctx);

    let first = server
        .get("/stats/top_paths")
        .add_query_param("days", "7")
        .await;
    first.assert_status_ok();
    let body: Value = first.json();
    assert_eq!(body["cache"], "miss");
    assert_eq!(body["data"], mocks::top_paths_rows());

    let second = server
        .get("/stats/top_paths")
        .add_query_param("days", "7")
        .await;
    let body: Value = second.json();
    assert_eq!(body["cache"], "hit");

    assert_eq!(ctx.read_sink.query_count("top_paths"), 1);
}

#[tokio::test]
async fn test_ttl_expiry_recomputes() {
    let ctx = TestContext::new();
    ctx.read_sink.set_report("top_paths", mocks::top_paths_rows());
    let server = server(&ctx);

    server.get("/stats/top_paths").await.assert_status_ok();

    // One second inside the 300s TTL: still served from cache.
    ctx.clock.advance(Duration::from_secs(299));
    let body: Value = server.get("/stats/top_paths").await.json();
    assert_eq!(body["cache"], "hit");

    // One second past it: recomputed.
    ctx.clock.advance(Duration::from_secs(2));
    let body: Value = server.get("/stats/top_paths").await.json();
    assert_eq!(body["cache"], "miss");

    assert_eq!(ctx.read_sink.query_count("top_paths"), 2);
}

#[tokio::test]
async fn test_filter_values_key_separately() {
    let ctx = TestContext::new();
    ctx.read_sink.set_report("top_paths", mocks::top_paths_rows());
    let server = server(&ctx);

    server
        .get("/stats/top_paths")
        .add_query_param("days", "7")
        .await
        .assert_status_ok();
    server
        .get("/stats/top_paths")
        .add_query_param("days", "14")
        .await
        .assert_status_ok();

    // Different filters are different cache entries.
    assert_eq!(ctx.read_sink.query_count("top_paths"), 2);

    // Same filters in a different order share one.
    let body: Value = server
        .get("/stats/top_paths")
        .add_query_param("limit", "5")
        .add_query_param("days", "7")
        .await
        .json();
    assert_eq!(body["cache"], "miss");

    let body: Value = server
        .get("/stats/top_paths")
        .add_query_param("days", "7")
        .add_query_param("limit", "5")
        .await
        .json();
    assert_eq!(body["cache"], "hit");
}

#[tokio::test]
async fn test_bypass_skips_cache_and_never_writes_back() {
    let ctx = TestContext::new();
    ctx.read_sink.set_report("top_paths", mocks::top_paths_rows());
    let server = server(&ctx);

    // Prime the cache.
    server.get("/stats/top_paths").await.assert_status_ok();

    // The sink's data changes underneath the cache.
    let updated = serde_json::json!([{"path": "/new", "views": 1}]);
    ctx.read_sink.set_report("top_paths", updated.clone());

    // Bypass sees fresh data.
    let body: Value = server
        .get("/stats/top_paths")
        .add_header("x-cache-bypass", "1")
        .await
        .json();
    assert_eq!(body["cache"], "bypass");
    assert_eq!(body["data"], updated);

    // A normal read still serves the cached value: the bypassed result
    // was not written back.
    let body: Value = server.get("/stats/top_paths").await.json();
    assert_eq!(body["cache"], "hit");
    assert_eq!(body["data"], mocks::top_paths_rows());
}

#[tokio::test]
async fn test_unknown_report_is_404() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let response = server.get("/stats/not_a_report").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_read_failure_propagates_and_is_not_cached() {
    let ctx = TestContext::new();
    ctx.read_sink.set_report("top_paths", mocks::top_paths_rows());
    let server = server(&ctx);

    ctx.read_sink.set_should_fail(true);
    let response = server.get("/stats/top_paths").await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    // Recovery computes fresh; the error was never stored.
    ctx.read_sink.set_should_fail(false);
    let body: Value = server.get("/stats/top_paths").await.json();
    assert_eq!(body["cache"], "miss");
    assert_eq!(body["data"], mocks::top_paths_rows());
}
