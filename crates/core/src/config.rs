//! Runtime toggles and deployment posture.
//!
//! Recognized options, constructed once and passed into components. None of
//! these are globals.

use serde::{Deserialize, Serialize};

/// Feature toggles for the core components.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Toggles {
    /// Serve analytics reads through the query cache.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    /// Prefer pre-aggregated rollup tables for reads where available.
    #[serde(default)]
    pub optimized_reads_enabled: bool,
    /// Batched sink writes; when off, rows are written one at a time.
    #[serde(default = "default_true")]
    pub batch_write_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            optimized_reads_enabled: false,
            batch_write_enabled: true,
        }
    }
}

/// Deployment posture. Decides how hard missing secrets fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Posture {
    Production,
    #[default]
    Development,
}

impl Posture {
    /// Missing key material is fatal only in production.
    pub fn secrets_required(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn from_env() -> Self {
        match std::env::var("SITEPULSE_ENV").as_deref() {
            Ok("production") | Ok("prod") => Self::Production,
            _ => Self::Development,
        }
    }
}
