//! Fire-and-forget event intake.
//!
//! Accepts a single event, a bare array, or `{ "events": [...] }`. Records
//! pass through the PII transforms before they reach the buffer, and a
//! slow or unavailable store never shows up here: submission is
//! non-blocking by contract.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use pulse_core::limits::MAX_COLLECT_EVENTS;
use pulse_core::EventRecord;
use serde::Deserialize;
use telemetry::metrics;
use tracing::{debug, warn};
use validator::Validate;

use crate::extractors::ClientIp;
use crate::response::{ApiError, CollectResponse};
use crate::state::AppState;

/// One inbound telemetry event, client-shaped.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IncomingEvent {
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub path: String,
    /// Client timestamp; server time when absent.
    pub timestamp: Option<DateTime<Utc>>,
    #[validate(length(max = 512))]
    #[serde(default)]
    pub user_agent: Option<String>,
    #[validate(length(max = 2048))]
    #[serde(default)]
    pub referrer: Option<String>,
    #[validate(range(min = 0.0, max = 86400.0))]
    #[serde(default)]
    pub time_on_page: Option<f64>,
}

/// Payload shapes the collect endpoint accepts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CollectPayload {
    Batch { events: Vec<IncomingEvent> },
    List(Vec<IncomingEvent>),
    Single(Box<IncomingEvent>),
}

impl CollectPayload {
    fn into_events(self) -> Vec<IncomingEvent> {
        match self {
            Self::Batch { events } => events,
            Self::List(events) => events,
            Self::Single(event) => vec![*event],
        }
    }
}

/// POST /collect - primary intake endpoint.
pub async fn collect_handler(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(payload): Json<CollectPayload>,
) -> Result<Json<CollectResponse>, ApiError> {
    metrics().collect_requests.inc();

    let events = payload.into_events();
    if events.len() > MAX_COLLECT_EVENTS {
        return Err(ApiError::bad_request(format!(
            "Batch has {} events, exceeds {} limit",
            events.len(),
            MAX_COLLECT_EVENTS
        )));
    }

    let pseudo_ip = pii::pseudonymize_ip(client_ip.or_unknown());

    let mut accepted = 0;
    let mut errors = Vec::new();

    for (idx, event) in events.into_iter().enumerate() {
        if let Err(e) = event.validate() {
            warn!(index = idx, error = %e, "Event failed validation");
            metrics().collect_rejected.inc();
            errors.push(format!("event {}: {}", idx, e));
            continue;
        }

        let record = EventRecord {
            session_id: state.pii.hash(&event.session_id),
            path: event.path,
            timestamp: event.timestamp.unwrap_or_else(Utc::now),
            ip: pseudo_ip.clone(),
            user_agent: event.user_agent.unwrap_or_default(),
            referrer: event.referrer,
            time_on_page: event.time_on_page,
        };

        state.buffer.submit(record);
        accepted += 1;
    }

    debug!(
        accepted = accepted,
        rejected = errors.len(),
        pending = state.buffer.size(),
        "Collect request processed"
    );

    Ok(Json(CollectResponse::new(accepted, errors)))
}
