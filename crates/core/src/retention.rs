//! Retention policy definitions.

use crate::events::Dataset;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default retention in days per dataset.
const DEFAULT_PAGEVIEW_DAYS: u32 = 180;
const DEFAULT_SESSION_DAYS: u32 = 90;
const DEFAULT_METRICS_DAYS: u32 = 30;

/// Maximum age for one dataset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub dataset: Dataset,
    pub max_age_days: u32,
}

/// The active retention policy table.
///
/// After a sweep completes, every persisted record in a dataset satisfies
/// `now - record_age <= max_age_days` (best-effort, not transactional
/// across datasets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionPolicies {
    policies: Vec<RetentionPolicy>,
}

impl Default for RetentionPolicies {
    fn default() -> Self {
        Self {
            policies: vec![
                RetentionPolicy {
                    dataset: Dataset::Pageviews,
                    max_age_days: DEFAULT_PAGEVIEW_DAYS,
                },
                RetentionPolicy {
                    dataset: Dataset::Sessions,
                    max_age_days: DEFAULT_SESSION_DAYS,
                },
                RetentionPolicy {
                    dataset: Dataset::SystemMetrics,
                    max_age_days: DEFAULT_METRICS_DAYS,
                },
            ],
        }
    }
}

impl RetentionPolicies {
    /// Override the window for one dataset.
    pub fn with_max_age(mut self, dataset: Dataset, max_age_days: u32) -> Self {
        for p in &mut self.policies {
            if p.dataset == dataset {
                p.max_age_days = max_age_days;
            }
        }
        self
    }

    /// The policies, in sweep order.
    pub fn iter(&self) -> impl Iterator<Item = &RetentionPolicy> {
        self.policies.iter()
    }

    /// The effective window for a dataset, if one is configured.
    pub fn max_age_days(&self, dataset: Dataset) -> Option<u32> {
        self.policies
            .iter()
            .find(|p| p.dataset == dataset)
            .map(|p| p.max_age_days)
    }

    /// Deletion cutoff for a dataset: records older than this go.
    pub fn cutoff(&self, dataset: Dataset, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.max_age_days(dataset)
            .map(|days| now - Duration::days(i64::from(days)))
    }
}
