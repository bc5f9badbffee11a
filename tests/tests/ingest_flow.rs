//! End-to-end tests for the ingest path.
//!
//! POST /collect → PII transforms → IngestBuffer → MockWriteSink. The
//! mock implements the same `WriteSink` trait as the ClickHouse sink, so
//! everything except the database network hop is production code.

use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};
use std::time::Duration;

/// Waits for spawned flush tasks to land `n` batches in the sink.
async fn wait_for_batches(ctx: &TestContext, n: usize) {
    for _ in 0..100 {
        if ctx.write_sink.batches().len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "expected {} batches, sink has {:?}",
        n,
        ctx.write_sink.batch_sizes()
    );
}

#[tokio::test]
async fn test_threshold_splits_into_exact_batches() {
    let ctx = TestContext::new();

    // 150 events against a threshold of 100: one threshold-triggered
    // flush, the remainder drained at shutdown.
    for n in 0..150 {
        ctx.buffer
            .submit(fixtures::event_record(&format!("s-{n}"), "/"));
    }
    wait_for_batches(&ctx, 1).await;
    ctx.flush().await;

    assert_eq!(ctx.write_sink.batch_sizes(), vec![100, 50]);

    // Round-trip: the sink received exactly what was submitted, in order.
    let records = ctx.write_sink.records();
    assert_eq!(records.len(), 150);
    assert_eq!(records[0].session_id, "s-0");
    assert_eq!(records[149].session_id, "s-149");
}

#[tokio::test]
async fn test_size_resets_after_flush() {
    let ctx = TestContext::new();

    for n in 0..40 {
        ctx.buffer
            .submit(fixtures::event_record(&format!("s-{n}"), "/"));
        assert_eq!(ctx.buffer.size(), n + 1);
    }

    ctx.flush().await;
    assert_eq!(ctx.buffer.size(), 0);

    ctx.buffer.submit(fixtures::event_record("s-after", "/"));
    assert_eq!(ctx.buffer.size(), 1);
}

#[tokio::test]
async fn test_overflow_drops_oldest() {
    let ctx = TestContext::with_buffer_config(buffer::BufferConfig {
        capacity: 10,
        flush_threshold: 1_000,
        flush_interval: Duration::from_secs(3_600),
    });

    for n in 0..15 {
        ctx.buffer
            .submit(fixtures::event_record(&format!("s-{n}"), "/"));
    }
    assert_eq!(ctx.buffer.size(), 10);

    ctx.flush().await;
    let records = ctx.write_sink.records();
    assert_eq!(records.len(), 10);
    assert_eq!(records[0].session_id, "s-5");
    assert_eq!(records[9].session_id, "s-14");
}

#[tokio::test]
async fn test_collect_endpoint_applies_pii_transforms() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/collect")
        .add_header("X-Forwarded-For", "198.51.100.77")
        .json(&fixtures::batch_payload(5))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["accepted"], 5);
    assert_eq!(body["rejected"], 0);

    ctx.flush().await;
    let records = ctx.write_sink.records();
    assert_eq!(records.len(), 5);

    for record in &records {
        // IP pseudonymized before it reached the buffer.
        assert_eq!(record.ip, "198.51.100.0");
        // Session identifier is a keyed hash, not the raw value.
        assert_eq!(record.session_id.len(), 64);
        assert!(!record.session_id.starts_with("session-"));
    }
}

#[tokio::test]
async fn test_invalid_events_rejected_individually() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let payload = serde_json::json!({
        "events": [
            fixtures::collect_event("good-session", "/ok"),
            { "session_id": "bad-session", "path": "" }
        ]
    });

    let response = server.post("/collect").json(&payload).await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["accepted"], 1);
    assert_eq!(body["rejected"], 1);

    ctx.flush().await;
    assert_eq!(ctx.write_sink.records().len(), 1);
}

#[tokio::test]
async fn test_sink_failure_invisible_to_producer() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    ctx.write_sink.set_should_fail(true);

    // Producer sees success regardless of sink state.
    let response = server.post("/collect").json(&fixtures::batch_payload(3)).await;
    response.assert_status_ok();

    // The flush retries once, then discards.
    ctx.flush().await;
    assert!(ctx.write_sink.batches().is_empty());

    // Recovery: later submissions land normally.
    ctx.write_sink.set_should_fail(false);
    let response = server.post("/collect").json(&fixtures::batch_payload(2)).await;
    response.assert_status_ok();
    ctx.flush().await;
    assert_eq!(ctx.write_sink.batch_sizes(), vec![2]);
}
