//! Common test setup functions.

use api::{router, AppState};
use axum::Router;
use buffer::{BufferConfig, IngestBuffer};
use cache::QueryCache;
use pii::{Pii, StaticSecrets};
use pulse_core::{ManualClock, Posture, RetentionPolicies};
use std::sync::Arc;
use std::time::Duration;
use worker::RetentionSweeper;

use crate::fixtures::OPERATOR_TOKEN;
use crate::mocks::{MockReadSink, MockWriteSink};

/// Test context with mocked sinks and a manual clock.
///
/// Exercises the real router, buffer, cache, sweeper, and gate; only the
/// row store behind the sink traits is replaced.
pub struct TestContext {
    pub write_sink: Arc<MockWriteSink>,
    pub read_sink: Arc<MockReadSink>,
    pub clock: Arc<ManualClock>,
    pub buffer: Arc<IngestBuffer>,
    pub sweeper: Arc<RetentionSweeper>,
    pub router: Router,
}

impl TestContext {
    /// Flush threshold used by default test buffers.
    pub const FLUSH_THRESHOLD: usize = 100;

    pub fn new() -> Self {
        Self::with_buffer_config(BufferConfig {
            capacity: 10_000,
            flush_threshold: Self::FLUSH_THRESHOLD,
            // Timer flushes are driven explicitly in tests.
            flush_interval: Duration::from_secs(3_600),
        })
    }

    pub fn with_buffer_config(buffer_config: BufferConfig) -> Self {
        let write_sink = MockWriteSink::new();
        let read_sink = MockReadSink::new();
        let clock = Arc::new(ManualClock::epoch());

        let buffer = IngestBuffer::new(buffer_config, write_sink.clone());
        let cache = Arc::new(QueryCache::new(clock.clone(), true));
        let sweeper = Arc::new(RetentionSweeper::new(
            read_sink.clone(),
            RetentionPolicies::default(),
            clock.clone(),
        ));

        let pii = Arc::new(
            Pii::new(
                &StaticSecrets::new([7u8; 32], "integration-hash-secret"),
                Posture::Production,
            )
            .expect("Failed to build PII transforms"),
        );

        let state = AppState::new(
            buffer.clone(),
            cache,
            read_sink.clone(),
            sweeper.clone(),
            pii,
            clock.clone(),
            OPERATOR_TOKEN,
        );
        let router = router(state);

        Self {
            write_sink,
            read_sink,
            clock,
            buffer,
            sweeper,
            router,
        }
    }

    /// Drain the buffer the way the shutdown path does.
    pub async fn flush(&self) {
        self.buffer.flush_all().await;
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
