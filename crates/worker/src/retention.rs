//! Retention sweeper.
//!
//! Deletes records whose age exceeds the configured policy window, one
//! dataset at a time. One dataset's failure never blocks the others; the
//! caller gets a report, never an error.

use chrono::{DateTime, Utc};
use clickhouse_store::ReadSink;
use pulse_core::{Dataset, RetentionPolicies, SharedClock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use telemetry::metrics;
use tracing::{info, warn};

/// Outcome of one sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionReport {
    /// Rows deleted per dataset table name.
    pub deleted: BTreeMap<String, u64>,
    /// Failures captured as data, one per failed dataset.
    pub errors: Vec<String>,
    /// True when another sweep was already in flight and this one did
    /// nothing.
    pub skipped: bool,
    pub started_at: DateTime<Utc>,
}

impl RetentionReport {
    fn skipped(now: DateTime<Utc>) -> Self {
        Self {
            deleted: BTreeMap::new(),
            errors: Vec::new(),
            skipped: true,
            started_at: now,
        }
    }

    pub fn total_deleted(&self) -> u64 {
        self.deleted.values().sum()
    }
}

/// Enforces the retention policy table against the row store.
pub struct RetentionSweeper {
    sink: Arc<dyn ReadSink>,
    policies: RetentionPolicies,
    clock: SharedClock,
    in_flight: AtomicBool,
}

impl RetentionSweeper {
    pub fn new(sink: Arc<dyn ReadSink>, policies: RetentionPolicies, clock: SharedClock) -> Self {
        Self {
            sink,
            policies,
            clock,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Runs one sweep across all configured datasets.
    ///
    /// Safe against overlapping invocations: a second call while one is in
    /// flight is a no-op reporting `skipped`, so counters are never
    /// doubled.
    pub async fn enforce_retention(&self) -> RetentionReport {
        let now = self.clock.now();

        if self.in_flight.swap(true, Ordering::SeqCst) {
            info!("Retention sweep already in flight, skipping");
            return RetentionReport::skipped(now);
        }

        let mut report = RetentionReport {
            deleted: BTreeMap::new(),
            errors: Vec::new(),
            skipped: false,
            started_at: now,
        };

        for policy in self.policies.iter() {
            let dataset = policy.dataset;
            let Some(cutoff) = self.policies.cutoff(dataset, now) else {
                continue;
            };

            match self.sink.delete_older_than(dataset, cutoff).await {
                Ok(count) => {
                    if count > 0 {
                        info!(
                            dataset = %dataset,
                            cutoff = %cutoff,
                            rows = count,
                            "Retention delete complete"
                        );
                    }
                    metrics().retention_rows_deleted.inc_by(count);
                    report.deleted.insert(dataset.table().to_string(), count);
                }
                Err(e) => {
                    warn!(dataset = %dataset, error = %e, "Retention delete failed");
                    metrics().retention_errors.inc();
                    report.errors.push(format!("{}: {}", dataset, e));
                }
            }
        }

        metrics().retention_sweeps.inc();
        self.in_flight.store(false, Ordering::SeqCst);

        info!(
            deleted = report.total_deleted(),
            errors = report.errors.len(),
            "Retention sweep finished"
        );
        report
    }

    /// The currently active policy values, for the sweeper itself and for
    /// audit reporting.
    pub fn retention_periods(&self) -> &RetentionPolicies {
        &self.policies
    }
}
