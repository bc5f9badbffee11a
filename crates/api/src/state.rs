//! Application state shared across handlers.

use crate::middleware::admission::{AdmissionGate, GateConfig, SharedAdmissionGate};
use buffer::IngestBuffer;
use cache::QueryCache;
use clickhouse_store::ReadSink;
use pii::Pii;
use pulse_core::limits::DEFAULT_STATS_TTL_SECS;
use pulse_core::SharedClock;
use std::sync::Arc;
use std::time::Duration;
use worker::RetentionSweeper;

/// Shared application state.
///
/// Everything here is wired at construction time; handlers only read.
#[derive(Clone)]
pub struct AppState {
    /// Ingest buffer in front of the write sink
    pub buffer: Arc<IngestBuffer>,
    /// Query cache over the read sink
    pub cache: Arc<QueryCache>,
    /// Read side of the row store
    pub read_sink: Arc<dyn ReadSink>,
    /// Retention sweeper, shared with the scheduler
    pub sweeper: Arc<RetentionSweeper>,
    /// Admission gate in front of the login entry point
    pub gate: SharedAdmissionGate,
    /// PII transforms
    pub pii: Arc<Pii>,
    /// Token authorizing operator endpoints
    pub operator_token: String,
    /// TTL for cached stats reads
    pub stats_ttl: Duration,
}

impl AppState {
    pub fn new(
        buffer: Arc<IngestBuffer>,
        cache: Arc<QueryCache>,
        read_sink: Arc<dyn ReadSink>,
        sweeper: Arc<RetentionSweeper>,
        pii: Arc<Pii>,
        clock: SharedClock,
        operator_token: impl Into<String>,
    ) -> Self {
        Self {
            buffer,
            cache,
            read_sink,
            sweeper,
            gate: Arc::new(AdmissionGate::new(GateConfig::default(), clock)),
            pii,
            operator_token: operator_token.into(),
            stats_ttl: Duration::from_secs(DEFAULT_STATS_TTL_SECS),
        }
    }

    /// Swap in a gate with non-default thresholds.
    pub fn with_gate(mut self, gate: AdmissionGate) -> Self {
        self.gate = Arc::new(gate);
        self
    }

    /// Starts the gate's stale-window cleanup task.
    pub fn start_gate_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let gate = self.gate.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                gate.cleanup_stale();
            }
        })
    }
}
