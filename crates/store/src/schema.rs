//! ClickHouse table schemas.
//!
//! Tables are partitioned by month on their age column so retention
//! deletions stay cheap. `CREATE ... IF NOT EXISTS` makes bootstrap
//! idempotent against an already-initialized database.

use crate::client::StoreClient;
use pulse_core::{Error, Result};
use tracing::info;

pub const CREATE_DATABASE: &str = "CREATE DATABASE IF NOT EXISTS sitepulse";

/// Raw pageview events written by the ingest buffer.
pub const CREATE_PAGEVIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sitepulse.pageviews (
    session_id String,
    path String,
    timestamp DateTime64(3),
    ip String,
    user_agent String,
    referrer String,
    time_on_page Nullable(Float64),
    created_at DateTime DEFAULT now()
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(timestamp)
ORDER BY (timestamp, session_id)
SETTINGS index_granularity = 8192
"#;

/// Session rollups, maintained by the reporting jobs upstream of this core.
pub const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sitepulse.sessions (
    session_id String,
    started_at DateTime64(3),
    ended_at Nullable(DateTime64(3)),
    pageview_count UInt32,
    entry_path String,
    exit_path Nullable(String),
    total_time_on_page Nullable(Float64),
    updated_at DateTime DEFAULT now()
)
ENGINE = ReplacingMergeTree(updated_at)
PARTITION BY toYYYYMM(started_at)
ORDER BY (started_at, session_id)
SETTINGS index_granularity = 8192
"#;

/// Host/system metric samples.
pub const CREATE_SYSTEM_METRICS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sitepulse.system_metrics (
    timestamp DateTime64(3),
    name LowCardinality(String),
    value Float64
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(timestamp)
ORDER BY (name, timestamp)
SETTINGS index_granularity = 8192
"#;

/// Daily pageview rollup used when optimized reads are enabled.
pub const CREATE_PAGEVIEW_ROLLUP_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sitepulse.pageview_counts_daily (
    day Date,
    path String,
    views UInt64
)
ENGINE = SummingMergeTree(views)
PARTITION BY toYYYYMM(day)
ORDER BY (day, path)
SETTINGS index_granularity = 8192
"#;

/// Creates the database and tables if they do not exist.
pub async fn init_schema(client: &StoreClient) -> Result<()> {
    let statements = [
        CREATE_DATABASE,
        CREATE_PAGEVIEWS_TABLE,
        CREATE_SESSIONS_TABLE,
        CREATE_SYSTEM_METRICS_TABLE,
        CREATE_PAGEVIEW_ROLLUP_TABLE,
    ];

    for sql in statements {
        client
            .inner()
            .query(sql)
            .execute()
            .await
            .map_err(|e| Error::sink(format!("Schema init error: {}", e)))?;
    }

    info!("Store schema initialized");
    Ok(())
}
