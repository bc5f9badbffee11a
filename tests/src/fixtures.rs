//! Test fixtures.

use chrono::Utc;
use pulse_core::EventRecord;
use serde_json::{json, Value};

/// Operator token wired into the test state.
pub const OPERATOR_TOKEN: &str = "test-operator-token";

/// A core-shaped event record, as it would sit in the buffer.
pub fn event_record(session_id: &str, path: &str) -> EventRecord {
    EventRecord {
        session_id: session_id.to_string(),
        path: path.to_string(),
        timestamp: Utc::now(),
        ip: "203.0.113.0".to_string(),
        user_agent: "Mozilla/5.0 (test)".to_string(),
        referrer: None,
        time_on_page: None,
    }
}

/// A client-shaped collect event.
pub fn collect_event(session_id: &str, path: &str) -> Value {
    json!({
        "session_id": session_id,
        "path": path,
        "user_agent": "Mozilla/5.0 (test)",
        "referrer": "https://search.example/",
        "time_on_page": 4.2
    })
}

/// Batch payload in the `{ "events": [...] }` shape.
pub fn batch_payload(count: usize) -> Value {
    let events: Vec<Value> = (0..count)
        .map(|n| collect_event(&format!("session-{n}"), &format!("/page/{n}")))
        .collect();
    json!({ "events": events })
}

/// Login payload.
pub fn login_payload(account: &str, token: &str) -> Value {
    json!({ "account": account, "token": token })
}
