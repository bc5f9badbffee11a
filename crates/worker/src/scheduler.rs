//! Worker scheduler for background tasks.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::info;

use crate::retention::RetentionSweeper;
use telemetry::metrics;

/// Worker scheduler configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Retention sweep interval
    pub retention_interval: Duration,
    /// Metrics snapshot log interval
    pub metrics_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            retention_interval: Duration::from_secs(
                pulse_core::limits::RETENTION_SWEEP_INTERVAL_SECS,
            ),
            metrics_interval: Duration::from_secs(60),
        }
    }
}

/// Background worker scheduler.
pub struct WorkerScheduler {
    config: WorkerConfig,
    sweeper: Arc<RetentionSweeper>,
}

impl WorkerScheduler {
    pub fn new(config: WorkerConfig, sweeper: Arc<RetentionSweeper>) -> Self {
        Self { config, sweeper }
    }

    /// Starts all background workers.
    pub fn start(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::new();

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_retention_worker().await;
        }));

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_metrics_snapshot().await;
        }));

        info!("Background workers started");
        handles
    }

    async fn run_retention_worker(&self) {
        let mut ticker = interval(self.config.retention_interval);
        // The immediate first tick would sweep at boot; skip it.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            // The sweeper reports failures as data; nothing to propagate.
            let report = self.sweeper.enforce_retention().await;
            if !report.errors.is_empty() {
                info!(errors = ?report.errors, "Retention sweep finished with errors");
            }
        }
    }

    async fn run_metrics_snapshot(&self) {
        let mut ticker = interval(self.config.metrics_interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let snapshot = metrics().snapshot();
            info!(
                submitted = snapshot.events_submitted,
                flushed = snapshot.events_flushed,
                dropped = snapshot.events_dropped_capacity,
                flush_failures = snapshot.flush_failures,
                cache_hits = snapshot.cache_hits,
                cache_misses = snapshot.cache_misses,
                retention_rows = snapshot.retention_rows_deleted,
                gate_denials = snapshot.gate_denials,
                buffer_depth = snapshot.buffer_depth,
                "Metrics snapshot"
            );
        }
    }
}
