//! Admission gate in front of POST /auth/login.

use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::Value;
use std::time::Duration;

fn server(ctx: &TestContext) -> TestServer {
    TestServer::new(ctx.router.clone()).expect("Failed to create test server")
}

#[tokio::test]
async fn test_valid_login_succeeds() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    let response = server
        .post("/auth/login")
        .json(&fixtures::login_payload("ops", fixtures::OPERATOR_TOKEN))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn test_failures_hit_threshold_then_deny_with_retry_after() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    // Five failed attempts within one window.
    for _ in 0..5 {
        let response = server
            .post("/auth/login")
            .json(&fixtures::login_payload("ops", "wrong"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    // The sixth is denied before credentials are even checked.
    let response = server
        .post("/auth/login")
        .json(&fixtures::login_payload("ops", fixtures::OPERATOR_TOKEN))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = response
        .header("Retry-After")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0);

    let body: Value = response.json();
    assert_eq!(body["code"], "rate_limited");
}

#[tokio::test]
async fn test_window_rollover_readmits() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    for _ in 0..5 {
        server
            .post("/auth/login")
            .json(&fixtures::login_payload("ops", "wrong"))
            .await;
    }
    server
        .post("/auth/login")
        .json(&fixtures::login_payload("ops", fixtures::OPERATOR_TOKEN))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    // Past the 900s window: counter reset to zero, login admitted.
    ctx.clock.advance(Duration::from_secs(901));
    let response = server
        .post("/auth/login")
        .json(&fixtures::login_payload("ops", fixtures::OPERATOR_TOKEN))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_success_clears_failure_count() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    for _ in 0..4 {
        server
            .post("/auth/login")
            .json(&fixtures::login_payload("ops", "wrong"))
            .await;
    }
    server
        .post("/auth/login")
        .json(&fixtures::login_payload("ops", fixtures::OPERATOR_TOKEN))
        .await
        .assert_status_ok();

    // Four more failures fit under the threshold again.
    for _ in 0..4 {
        let response = server
            .post("/auth/login")
            .json(&fixtures::login_payload("ops", "wrong"))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_identities_are_independent() {
    let ctx = TestContext::new();
    let server = server(&ctx);

    for _ in 0..5 {
        server
            .post("/auth/login")
            .json(&fixtures::login_payload("alice", "wrong"))
            .await;
    }
    server
        .post("/auth/login")
        .json(&fixtures::login_payload("alice", "wrong"))
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    // A different account from the same client is its own identity.
    let response = server
        .post("/auth/login")
        .json(&fixtures::login_payload("bob", fixtures::OPERATOR_TOKEN))
        .await;
    response.assert_status_ok();
}
