//! Read sink: named aggregate queries and retention deletions.

use crate::client::StoreClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clickhouse::Row;
use pulse_core::{Dataset, Error, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Read side of the row store.
///
/// `run_query` serves the enumerable set of aggregate reports the stats
/// surface exposes; `delete_older_than` is the retention sweeper's only
/// entry point into storage.
#[async_trait]
pub trait ReadSink: Send + Sync {
    async fn run_query(&self, name: &str, filters: &[(String, String)]) -> Result<Value>;

    /// Deletes records older than `cutoff`, returning how many went.
    async fn delete_older_than(&self, dataset: Dataset, cutoff: DateTime<Utc>) -> Result<u64>;
}

#[derive(Debug, Row, Deserialize, serde::Serialize)]
struct DailyCountRow {
    day: String,
    views: u64,
}

#[derive(Debug, Row, Deserialize, serde::Serialize)]
struct PathCountRow {
    path: String,
    views: u64,
}

#[derive(Debug, Row, Deserialize, serde::Serialize)]
struct SessionSummaryRow {
    sessions: u64,
    avg_time_on_page: f64,
}

#[derive(Debug, Row, Deserialize, serde::Serialize)]
struct MetricRollupRow {
    name: String,
    avg_value: f64,
    max_value: f64,
}

/// ClickHouse-backed [`ReadSink`].
pub struct ClickHouseReadSink {
    client: StoreClient,
    /// Serve daily counts from the pre-aggregated rollup table.
    optimized_reads: bool,
}

impl ClickHouseReadSink {
    pub fn new(client: StoreClient, optimized_reads: bool) -> Self {
        Self {
            client,
            optimized_reads,
        }
    }

    fn days_filter(filters: &[(String, String)]) -> u32 {
        lookup(filters, "days")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30)
    }

    async fn pageview_counts(&self, filters: &[(String, String)]) -> Result<Value> {
        let days = Self::days_filter(filters);

        let sql = if self.optimized_reads {
            "SELECT toString(day) AS day, sum(views) AS views \
             FROM sitepulse.pageview_counts_daily \
             WHERE day >= today() - ? GROUP BY day ORDER BY day"
        } else {
            "SELECT toString(toDate(timestamp)) AS day, count() AS views \
             FROM sitepulse.pageviews \
             WHERE timestamp >= now() - INTERVAL ? DAY GROUP BY day ORDER BY day"
        };

        let rows: Vec<DailyCountRow> = self
            .client
            .inner()
            .query(sql)
            .bind(days)
            .fetch_all()
            .await
            .map_err(|e| Error::sink(format!("Query error: {}", e)))?;

        Ok(serde_json::to_value(rows)?)
    }

    async fn top_paths(&self, filters: &[(String, String)]) -> Result<Value> {
        let days = Self::days_filter(filters);
        let limit: u32 = lookup(filters, "limit")
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let rows: Vec<PathCountRow> = self
            .client
            .inner()
            .query(
                "SELECT path, count() AS views FROM sitepulse.pageviews \
                 WHERE timestamp >= now() - INTERVAL ? DAY \
                 GROUP BY path ORDER BY views DESC LIMIT ?",
            )
            .bind(days)
            .bind(limit)
            .fetch_all()
            .await
            .map_err(|e| Error::sink(format!("Query error: {}", e)))?;

        Ok(serde_json::to_value(rows)?)
    }

    async fn session_summary(&self, filters: &[(String, String)]) -> Result<Value> {
        let days = Self::days_filter(filters);

        let row: SessionSummaryRow = self
            .client
            .inner()
            .query(
                "SELECT uniqExact(session_id) AS sessions, \
                 avg(coalesce(time_on_page, 0)) AS avg_time_on_page \
                 FROM sitepulse.pageviews WHERE timestamp >= now() - INTERVAL ? DAY",
            )
            .bind(days)
            .fetch_one()
            .await
            .map_err(|e| Error::sink(format!("Query error: {}", e)))?;

        Ok(serde_json::to_value(row)?)
    }

    async fn metric_rollup(&self, filters: &[(String, String)]) -> Result<Value> {
        let days = Self::days_filter(filters);

        let rows: Vec<MetricRollupRow> = self
            .client
            .inner()
            .query(
                "SELECT name, avg(value) AS avg_value, max(value) AS max_value \
                 FROM sitepulse.system_metrics \
                 WHERE timestamp >= now() - INTERVAL ? DAY GROUP BY name ORDER BY name",
            )
            .bind(days)
            .fetch_all()
            .await
            .map_err(|e| Error::sink(format!("Query error: {}", e)))?;

        Ok(serde_json::to_value(rows)?)
    }
}

fn lookup<'a>(filters: &'a [(String, String)], key: &str) -> Option<&'a str> {
    filters
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[async_trait]
impl ReadSink for ClickHouseReadSink {
    async fn run_query(&self, name: &str, filters: &[(String, String)]) -> Result<Value> {
        match name {
            "pageview_counts" => self.pageview_counts(filters).await,
            "top_paths" => self.top_paths(filters).await,
            "session_summary" => self.session_summary(filters).await,
            "metric_rollup" => self.metric_rollup(filters).await,
            other => Err(Error::UnknownReport(other.to_string())),
        }
    }

    async fn delete_older_than(&self, dataset: Dataset, cutoff: DateTime<Utc>) -> Result<u64> {
        let table = dataset.table();
        let column = dataset.age_column();
        let cutoff_ms = cutoff.timestamp_millis();

        // Count first so the sweeper can report; the mutation below is
        // asynchronous on the server side.
        let count_sql = format!(
            "SELECT count() FROM sitepulse.{} WHERE {} < fromUnixTimestamp64Milli(?)",
            table, column
        );
        let count: u64 = self
            .client
            .inner()
            .query(&count_sql)
            .bind(cutoff_ms)
            .fetch_one()
            .await
            .map_err(|e| Error::sink(format!("Count error: {}", e)))?;

        if count == 0 {
            debug!(dataset = %dataset, "Nothing past the retention cutoff");
            return Ok(0);
        }

        let delete_sql = format!(
            "ALTER TABLE sitepulse.{} DELETE WHERE {} < fromUnixTimestamp64Milli(?)",
            table, column
        );
        self.client
            .inner()
            .query(&delete_sql)
            .bind(cutoff_ms)
            .execute()
            .await
            .map_err(|e| Error::sink(format!("Delete error: {}", e)))?;

        debug!(dataset = %dataset, rows = count, "Issued retention delete");
        Ok(count)
    }
}
