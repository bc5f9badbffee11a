//! In-process metrics.
//!
//! Plain atomics; a snapshot is logged periodically by the worker
//! scheduler. No external metrics backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge that can move both ways.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Latency histogram over fixed millisecond buckets.
#[derive(Debug, Default)]
pub struct Histogram {
    buckets: [AtomicU64; 9],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    const BOUNDS_MS: [u64; 9] = [1, 5, 10, 25, 50, 100, 500, 1000, 5000];

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BOUNDS_MS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BOUNDS_MS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / count as f64
        }
    }
}

/// Collected metrics for the analytics core.
#[derive(Debug, Default)]
pub struct Metrics {
    // Ingest buffer
    pub events_submitted: Counter,
    pub events_dropped_capacity: Counter,
    pub events_flushed: Counter,
    pub flush_batches: Counter,
    pub flush_retries: Counter,
    pub flush_failures: Counter,

    // Query cache
    pub cache_hits: Counter,
    pub cache_misses: Counter,
    pub cache_bypass: Counter,

    // Retention sweeper
    pub retention_sweeps: Counter,
    pub retention_rows_deleted: Counter,
    pub retention_errors: Counter,

    // Admission gate
    pub gate_denials: Counter,
    pub gate_failures_recorded: Counter,

    // HTTP intake
    pub collect_requests: Counter,
    pub collect_rejected: Counter,

    // Latency
    pub flush_latency_ms: Histogram,
    pub query_latency_ms: Histogram,

    // Gauges
    pub buffer_depth: Gauge,
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events_submitted: u64,
    pub events_dropped_capacity: u64,
    pub events_flushed: u64,
    pub flush_batches: u64,
    pub flush_failures: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_bypass: u64,
    pub retention_sweeps: u64,
    pub retention_rows_deleted: u64,
    pub retention_errors: u64,
    pub gate_denials: u64,
    pub buffer_depth: u64,
    pub flush_latency_mean_ms: f64,
    pub query_latency_mean_ms: f64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            events_submitted: self.events_submitted.get(),
            events_dropped_capacity: self.events_dropped_capacity.get(),
            events_flushed: self.events_flushed.get(),
            flush_batches: self.flush_batches.get(),
            flush_failures: self.flush_failures.get(),
            cache_hits: self.cache_hits.get(),
            cache_misses: self.cache_misses.get(),
            cache_bypass: self.cache_bypass.get(),
            retention_sweeps: self.retention_sweeps.get(),
            retention_rows_deleted: self.retention_rows_deleted.get(),
            retention_errors: self.retention_errors.get(),
            gate_denials: self.gate_denials.get(),
            buffer_depth: self.buffer_depth.get(),
            flush_latency_mean_ms: self.flush_latency_ms.mean(),
            query_latency_mean_ms: self.query_latency_ms.mean(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::default);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
