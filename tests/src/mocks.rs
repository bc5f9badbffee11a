//! Mock implementations for testing.

use async_trait::async_trait;
use buffer::WriteSink;
use chrono::{DateTime, Utc};
use clickhouse_store::ReadSink;
use parking_lot::Mutex;
use pulse_core::{Dataset, Error, EventRecord, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mock write sink that captures flushed batches in memory.
///
/// Implements the same `WriteSink` trait as the real ClickHouse sink, so
/// tests verify exactly what the buffer would hand to storage without a
/// running database.
#[derive(Clone)]
pub struct MockWriteSink {
    batches: Arc<Mutex<Vec<Vec<EventRecord>>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockWriteSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            batches: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        })
    }

    /// All captured batches, in flush order.
    pub fn batches(&self) -> Vec<Vec<EventRecord>> {
        self.batches.lock().clone()
    }

    /// Sizes of captured batches, in flush order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(|b| b.len()).collect()
    }

    /// All captured records, flattened.
    pub fn records(&self) -> Vec<EventRecord> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    pub fn clear(&self) {
        self.batches.lock().clear();
    }

    /// Simulate sink failures.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }
}

#[async_trait]
impl WriteSink for MockWriteSink {
    async fn write_batch(&self, records: &[EventRecord]) -> Result<()> {
        if *self.should_fail.lock() {
            return Err(Error::sink("Mock write sink failure"));
        }
        self.batches.lock().push(records.to_vec());
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        !*self.should_fail.lock()
    }
}

/// Mock read sink with canned report rows and scripted retention counts.
#[derive(Clone)]
pub struct MockReadSink {
    /// Rows returned per report name.
    reports: Arc<Mutex<BTreeMap<String, Value>>>,
    /// Rows "past the cutoff" per dataset, drained by the first delete.
    aged: Arc<Mutex<BTreeMap<Dataset, u64>>>,
    /// Datasets whose deletes fail.
    failing_datasets: Arc<Mutex<Vec<Dataset>>>,
    /// Fail every query when set.
    should_fail: Arc<Mutex<bool>>,
    /// run_query invocations, for compute-count assertions.
    query_calls: Arc<Mutex<Vec<String>>>,
}

impl MockReadSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reports: Arc::new(Mutex::new(BTreeMap::new())),
            aged: Arc::new(Mutex::new(BTreeMap::new())),
            failing_datasets: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
            query_calls: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn set_report(&self, name: &str, rows: Value) {
        self.reports.lock().insert(name.to_string(), rows);
    }

    pub fn set_aged(&self, dataset: Dataset, rows: u64) {
        self.aged.lock().insert(dataset, rows);
    }

    pub fn fail_dataset(&self, dataset: Dataset) {
        self.failing_datasets.lock().push(dataset);
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    /// How many times `run_query` ran for a report.
    pub fn query_count(&self, name: &str) -> usize {
        self.query_calls.lock().iter().filter(|n| *n == name).count()
    }
}

#[async_trait]
impl ReadSink for MockReadSink {
    async fn run_query(&self, name: &str, _filters: &[(String, String)]) -> Result<Value> {
        if *self.should_fail.lock() {
            return Err(Error::sink("Mock read sink failure"));
        }
        self.query_calls.lock().push(name.to_string());

        self.reports
            .lock()
            .get(name)
            .cloned()
            .map(Ok)
            .unwrap_or_else(|| Err(Error::UnknownReport(name.to_string())))
    }

    async fn delete_older_than(&self, dataset: Dataset, _cutoff: DateTime<Utc>) -> Result<u64> {
        if self.failing_datasets.lock().contains(&dataset) {
            return Err(Error::sink("Mock delete failure"));
        }
        Ok(self.aged.lock().remove(&dataset).unwrap_or(0))
    }
}

/// Canned rows for the default test report.
pub fn top_paths_rows() -> Value {
    json!([
        {"path": "/", "views": 812},
        {"path": "/pricing", "views": 233},
        {"path": "/docs", "views": 104}
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_write_sink_captures_batches() {
        let sink = MockWriteSink::new();
        let records = vec![crate::fixtures::event_record("s1", "/")];

        sink.write_batch(&records).await.unwrap();
        assert_eq!(sink.batch_sizes(), vec![1]);
        assert_eq!(sink.records()[0].path, "/");
    }

    #[tokio::test]
    async fn test_mock_write_sink_failure_mode() {
        let sink = MockWriteSink::new();
        sink.set_should_fail(true);

        let result = sink.write_batch(&[]).await;
        assert!(result.is_err());
        assert!(!sink.is_healthy());
    }

    #[tokio::test]
    async fn test_mock_read_sink_counts_queries() {
        let sink = MockReadSink::new();
        sink.set_report("top_paths", top_paths_rows());

        sink.run_query("top_paths", &[]).await.unwrap();
        sink.run_query("top_paths", &[]).await.unwrap();
        assert_eq!(sink.query_count("top_paths"), 2);

        assert!(sink.run_query("unknown", &[]).await.is_err());
    }
}
