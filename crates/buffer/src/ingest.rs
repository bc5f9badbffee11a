//! The ingest buffer.

use crate::sink::WriteSink;
use parking_lot::Mutex;
use pulse_core::limits::{BUFFER_HARD_CAP, FLUSH_BATCH_THRESHOLD, FLUSH_INTERVAL_MS};
use pulse_core::EventRecord;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Ingest buffer configuration.
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Hard cap on pending records. When full, the oldest are dropped.
    pub capacity: usize,
    /// Pending count that triggers an immediate flush.
    pub flush_threshold: usize,
    /// Timer-driven flush interval.
    pub flush_interval: Duration,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: BUFFER_HARD_CAP,
            flush_threshold: FLUSH_BATCH_THRESHOLD,
            flush_interval: Duration::from_millis(FLUSH_INTERVAL_MS),
        }
    }
}

/// The one piece of shared mutable state every producer touches.
/// Held only for the append-and-maybe-swap, never across a sink call.
struct Pending {
    records: VecDeque<EventRecord>,
    last_flush: Instant,
    flush_in_flight: bool,
}

/// Coalesces event records and flushes them in batches.
///
/// `submit` is O(1) and never waits on the sink: when a flush triggers,
/// the pending sequence is swapped out under the lock and written from a
/// spawned task while new submissions accumulate into the fresh buffer.
pub struct IngestBuffer {
    pending: Mutex<Pending>,
    sink: Arc<dyn WriteSink>,
    config: BufferConfig,
}

impl IngestBuffer {
    pub fn new(config: BufferConfig, sink: Arc<dyn WriteSink>) -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(Pending {
                records: VecDeque::with_capacity(config.flush_threshold),
                last_flush: Instant::now(),
                flush_in_flight: false,
            }),
            sink,
            config,
        })
    }

    /// Accepts a record. Never blocks, never errors.
    ///
    /// At capacity the oldest record is dropped: ingestion favors
    /// availability over completeness.
    pub fn submit(self: &Arc<Self>, record: EventRecord) {
        let batch = {
            let mut pending = self.pending.lock();

            if pending.records.len() >= self.config.capacity {
                pending.records.pop_front();
                metrics().events_dropped_capacity.inc();
            }
            pending.records.push_back(record);
            metrics().events_submitted.inc();
            metrics().buffer_depth.set(pending.records.len() as u64);

            if pending.records.len() >= self.config.flush_threshold && !pending.flush_in_flight {
                pending.flush_in_flight = true;
                Some(pending.records.drain(..).collect::<Vec<_>>())
            } else {
                None
            }
        };

        if let Some(batch) = batch {
            let buffer = self.clone();
            tokio::spawn(async move {
                buffer.write_out(batch).await;
            });
        }
    }

    /// Current pending count.
    pub fn size(&self) -> usize {
        self.pending.lock().records.len()
    }

    /// Reachability of the sink behind this buffer.
    pub fn sink_healthy(&self) -> bool {
        self.sink.is_healthy()
    }

    /// Writes one swapped-out batch: one retry, then the batch is
    /// discarded. Failures are counted, never surfaced to producers.
    async fn write_out(&self, batch: Vec<EventRecord>) {
        let count = batch.len();
        let start = Instant::now();

        let mut result = self.sink.write_batch(&batch).await;
        if let Err(ref e) = result {
            warn!(count = count, error = %e, "Batch write failed, retrying once");
            metrics().flush_retries.inc();
            result = self.sink.write_batch(&batch).await;
        }

        match result {
            Ok(()) => {
                metrics().events_flushed.inc_by(count as u64);
                metrics().flush_batches.inc();
                metrics()
                    .flush_latency_ms
                    .observe(start.elapsed().as_millis() as u64);
                debug!(count = count, "Flushed batch to write sink");
            }
            Err(e) => {
                metrics().flush_failures.inc();
                warn!(count = count, error = %e, "Batch discarded after retry");
            }
        }

        let mut pending = self.pending.lock();
        pending.flush_in_flight = false;
        pending.last_flush = Instant::now();
        metrics().buffer_depth.set(pending.records.len() as u64);
    }

    /// Swaps out the pending records if the interval elapsed and no flush
    /// is already running.
    fn take_aged(&self) -> Option<Vec<EventRecord>> {
        let mut pending = self.pending.lock();
        if pending.flush_in_flight || pending.records.is_empty() {
            return None;
        }
        if pending.last_flush.elapsed() < self.config.flush_interval {
            return None;
        }
        pending.flush_in_flight = true;
        Some(pending.records.drain(..).collect())
    }

    /// Starts the timer-driven flush task.
    pub fn start_flush_task(self: &Arc<Self>) -> JoinHandle<()> {
        let buffer = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(buffer.config.flush_interval);

            loop {
                ticker.tick().await;

                if let Some(batch) = buffer.take_aged() {
                    buffer.write_out(batch).await;
                }
            }
        })
    }

    /// Drains everything still pending. Used at shutdown so a stopping
    /// process does not strand accepted records.
    pub async fn flush_all(&self) {
        let batch = {
            let mut pending = self.pending.lock();
            if pending.records.is_empty() {
                None
            } else {
                Some(pending.records.drain(..).collect::<Vec<_>>())
            }
        };

        if let Some(batch) = batch {
            self.write_out(batch).await;
        }
    }
}
