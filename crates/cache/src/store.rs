//! The cache itself.

use crate::key::QueryKey;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use pulse_core::{Result, SharedClock};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use telemetry::metrics;
use tracing::debug;

/// How a cached read was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Hit,
    Miss,
    Bypass,
}

/// Request-scoped context the bypass predicate looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    /// Explicit bypass flag (diagnostic header).
    pub bypass_cache: bool,
}

/// Pure predicate: should this request skip the cache entirely?
///
/// Bypassed results are never written back, so diagnostic calls cannot
/// poison the cache.
pub fn should_bypass(ctx: &RequestContext) -> bool {
    ctx.bypass_cache
}

struct CacheEntry {
    value: Value,
    stored_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.stored_at);
        age >= chrono::Duration::zero()
            && age < chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::MAX)
    }
}

/// TTL cache over expensive read queries.
///
/// Entries are immutable once written; a new computation replaces rather
/// than mutates. Eviction is passive: expired entries are dead on the
/// freshness check and overwritten by the next miss. No capacity bound —
/// the set of distinct query shapes is small and enumerable, and callers
/// choose TTLs short enough to bound memory.
pub struct QueryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: SharedClock,
    enabled: bool,
}

impl QueryCache {
    pub fn new(clock: SharedClock, enabled: bool) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            enabled,
        }
    }

    /// Serves from cache when fresh, otherwise runs `compute` exactly once
    /// for this call and stores the result under `ttl`.
    ///
    /// A `compute` error propagates and is never cached. Concurrent misses
    /// on the same key each compute — there is deliberately no per-key
    /// single-flight here.
    pub async fn cached_query<F, Fut>(
        &self,
        key: &QueryKey,
        ttl: Duration,
        compute: F,
    ) -> Result<(Value, CacheStatus)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if !self.enabled {
            metrics().cache_bypass.inc();
            let value = compute().await?;
            return Ok((value, CacheStatus::Bypass));
        }

        if let Some(value) = self.lookup(key) {
            metrics().cache_hits.inc();
            debug!(key = %key, "Cache hit");
            return Ok((value, CacheStatus::Hit));
        }

        let value = compute().await?;

        self.entries.write().insert(
            key.as_str().to_string(),
            CacheEntry {
                value: value.clone(),
                stored_at: self.clock.now(),
                ttl,
            },
        );
        metrics().cache_misses.inc();
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache miss, stored");

        Ok((value, CacheStatus::Miss))
    }

    fn lookup(&self, key: &QueryKey) -> Option<Value> {
        let entries = self.entries.read();
        let entry = entries.get(key.as_str())?;
        entry.is_fresh(self.clock.now()).then(|| entry.value.clone())
    }

    /// Explicitly drops one entry.
    pub fn invalidate(&self, key: &QueryKey) {
        self.entries.write().remove(key.as_str());
    }

    /// Resident entries, including logically dead ones.
    pub fn resident_len(&self) -> usize {
        self.entries.read().len()
    }
}
