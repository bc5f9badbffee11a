//! Cached analytics reads.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use cache::{should_bypass, CacheStatus, QueryKey, RequestContext};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use telemetry::metrics;

use crate::response::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub report: String,
    pub cache: CacheStatus,
    pub data: Value,
}

/// GET /stats/{report} - aggregated analytics, served through the cache.
///
/// `x-cache-bypass: 1` skips the cache for diagnostics; bypassed results
/// are never written back.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(report): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, ApiError> {
    let start = Instant::now();

    let filters: Vec<(String, String)> = params.into_iter().collect();
    let ctx = RequestContext {
        bypass_cache: headers
            .get("x-cache-bypass")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    };

    let (data, status) = if should_bypass(&ctx) {
        metrics().cache_bypass.inc();
        let value = state.read_sink.run_query(&report, &filters).await?;
        (value, CacheStatus::Bypass)
    } else {
        let key = QueryKey::new(&report, &filters);
        let read_sink = state.read_sink.clone();
        let report_name = report.clone();
        state
            .cache
            .cached_query(&key, state.stats_ttl, move || async move {
                read_sink.run_query(&report_name, &filters).await
            })
            .await?
    };

    metrics()
        .query_latency_ms
        .observe(start.elapsed().as_millis() as u64);

    Ok(Json(StatsResponse {
        report,
        cache: status,
        data,
    }))
}
