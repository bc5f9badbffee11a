//! Event record and dataset definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single traffic telemetry event.
///
/// Append-only: never mutated after creation. Owned by the ingest buffer
/// until flushed, at which point ownership transfers to the write sink.
/// The `ip` and `session_id` fields are expected to already be
/// pseudonymized/hashed by the time a record reaches the buffer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventRecord {
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub path: String,
    pub timestamp: DateTime<Utc>,
    #[validate(length(max = 45))]
    pub ip: String,
    #[validate(length(max = 512))]
    pub user_agent: String,
    /// Referrer URL, empty-allowed.
    #[validate(length(max = 2048))]
    pub referrer: Option<String>,
    /// Seconds spent on the page, when the client reports it.
    #[validate(range(min = 0.0, max = 86400.0))]
    pub time_on_page: Option<f64>,
}

/// Persisted datasets subject to retention enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Pageviews,
    Sessions,
    SystemMetrics,
}

impl Dataset {
    /// All datasets, in sweep order.
    pub const ALL: [Dataset; 3] = [Self::Pageviews, Self::Sessions, Self::SystemMetrics];

    /// Table name in the row store.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Pageviews => "pageviews",
            Self::Sessions => "sessions",
            Self::SystemMetrics => "system_metrics",
        }
    }

    /// Timestamp column used for age comparisons.
    pub fn age_column(&self) -> &'static str {
        match self {
            Self::Pageviews => "timestamp",
            Self::Sessions => "started_at",
            Self::SystemMetrics => "timestamp",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}
