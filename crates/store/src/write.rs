//! Write sink: batched pageview inserts.

use crate::client::StoreClient;
use async_trait::async_trait;
use buffer::WriteSink;
use clickhouse::Row;
use pulse_core::{Error, EventRecord, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use telemetry::health;
use tracing::debug;

#[derive(Debug, Row, Serialize)]
struct PageviewRow {
    session_id: String,
    path: String,
    /// Unix milliseconds, mapped to DateTime64(3).
    timestamp: i64,
    ip: String,
    user_agent: String,
    referrer: String,
    time_on_page: Option<f64>,
}

impl From<&EventRecord> for PageviewRow {
    fn from(record: &EventRecord) -> Self {
        Self {
            session_id: record.session_id.clone(),
            path: record.path.clone(),
            timestamp: record.timestamp.timestamp_millis(),
            ip: record.ip.clone(),
            user_agent: record.user_agent.clone(),
            referrer: record.referrer.clone().unwrap_or_default(),
            time_on_page: record.time_on_page,
        }
    }
}

/// ClickHouse-backed [`WriteSink`].
pub struct ClickHouseWriteSink {
    client: StoreClient,
    /// When off, rows are committed one at a time (compatibility path).
    batch_write: bool,
    reachable: AtomicBool,
}

impl ClickHouseWriteSink {
    pub fn new(client: StoreClient, batch_write: bool) -> Self {
        Self {
            client,
            batch_write,
            reachable: AtomicBool::new(true),
        }
    }

    async fn insert_batched(&self, records: &[EventRecord]) -> Result<()> {
        let mut insert = self
            .client
            .inner()
            .insert("pageviews")
            .map_err(|e| Error::sink(format!("Insert error: {}", e)))?;

        for record in records {
            insert
                .write(&PageviewRow::from(record))
                .await
                .map_err(|e| Error::sink(format!("Write error: {}", e)))?;
        }

        insert
            .end()
            .await
            .map_err(|e| Error::sink(format!("End error: {}", e)))
    }

    async fn insert_rows(&self, records: &[EventRecord]) -> Result<()> {
        for record in records {
            let mut insert = self
                .client
                .inner()
                .insert("pageviews")
                .map_err(|e| Error::sink(format!("Insert error: {}", e)))?;
            insert
                .write(&PageviewRow::from(record))
                .await
                .map_err(|e| Error::sink(format!("Write error: {}", e)))?;
            insert
                .end()
                .await
                .map_err(|e| Error::sink(format!("End error: {}", e)))?;
        }
        Ok(())
    }

    fn note_outcome(&self, result: &Result<()>) {
        match result {
            Ok(()) => {
                self.reachable.store(true, Ordering::Relaxed);
                health().store.set_healthy();
            }
            Err(e) => {
                self.reachable.store(false, Ordering::Relaxed);
                health().store.set_unhealthy(e.to_string());
            }
        }
    }
}

#[async_trait]
impl WriteSink for ClickHouseWriteSink {
    async fn write_batch(&self, records: &[EventRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let result = if self.batch_write {
            self.insert_batched(records).await
        } else {
            self.insert_rows(records).await
        };
        self.note_outcome(&result);

        if result.is_ok() {
            debug!(count = records.len(), "Inserted pageview batch");
        }
        result
    }

    fn is_healthy(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }
}
