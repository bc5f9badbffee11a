//! Admission gate: per-identity throttling of failed authentication
//! attempts.
//!
//! Fixed window per opaque identity string. Checking the limit never
//! counts as an attempt, and successful authentications never count
//! toward it. State is in-memory only; a restart resets all counters.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pulse_core::limits::{GATE_MAX_FAILURES, GATE_WINDOW_SECS};
use pulse_core::SharedClock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tracing::warn;

/// Admission gate configuration.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Fixed window length.
    pub window: Duration,
    /// Failed attempts tolerated per identity per window.
    pub max_failures: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(GATE_WINDOW_SECS),
            max_failures: GATE_MAX_FAILURES,
        }
    }
}

/// Verdict for one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    pub allowed: bool,
    /// Remaining window time when denied, rounded up to at least 1s.
    pub retry_after_secs: Option<u64>,
}

impl GateDecision {
    const ALLOWED: GateDecision = GateDecision {
        allowed: true,
        retry_after_secs: None,
    };
}

struct Window {
    started_at: DateTime<Utc>,
    failures: u32,
}

/// Fixed-window failure limiter keyed by opaque identity.
pub struct AdmissionGate {
    windows: Mutex<HashMap<String, Window>>,
    config: GateConfig,
    clock: SharedClock,
}

impl AdmissionGate {
    pub fn new(config: GateConfig, clock: SharedClock) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
            clock,
        }
    }

    fn window_len(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.config.window).unwrap_or_else(|_| chrono::Duration::MAX)
    }

    /// Is this identity currently admitted? Never mutates the counter,
    /// but lazily drops a window that has rolled over.
    pub fn check_limit(&self, identity: &str) -> GateDecision {
        let now = self.clock.now();
        let mut windows = self.windows.lock();

        let (started_at, failures) = match windows.get(identity) {
            Some(window) => (window.started_at, window.failures),
            None => return GateDecision::ALLOWED,
        };

        let elapsed = now.signed_duration_since(started_at);
        if elapsed >= self.window_len() {
            // Window rolled over; the counter resets to zero.
            windows.remove(identity);
            return GateDecision::ALLOWED;
        }

        if failures >= self.config.max_failures {
            let remaining = (self.window_len() - elapsed).num_milliseconds().max(0);
            let retry_after = ((remaining as u64) + 999) / 1000;
            metrics().gate_denials.inc();
            warn!(identity = identity, retry_after_secs = retry_after, "Admission denied");
            return GateDecision {
                allowed: false,
                retry_after_secs: Some(retry_after.max(1)),
            };
        }

        GateDecision::ALLOWED
    }

    /// Records one failed authentication attempt. Atomic increment under
    /// the map lock so concurrent failures cannot both read a stale count.
    pub fn record_failure(&self, identity: &str) {
        let now = self.clock.now();
        let window_len = self.window_len();
        let mut windows = self.windows.lock();

        let window = windows.entry(identity.to_string()).or_insert(Window {
            started_at: now,
            failures: 0,
        });

        if now.signed_duration_since(window.started_at) >= window_len {
            window.started_at = now;
            window.failures = 0;
        }
        window.failures += 1;
        metrics().gate_failures_recorded.inc();
    }

    /// A successful authentication clears the identity's window.
    pub fn record_success(&self, identity: &str) {
        self.windows.lock().remove(identity);
    }

    /// Drops windows that have rolled over. Run periodically so idle
    /// identities do not accumulate.
    pub fn cleanup_stale(&self) {
        let now = self.clock.now();
        let window_len = self.window_len();
        self.windows
            .lock()
            .retain(|_, w| now.signed_duration_since(w.started_at) < window_len);
    }

    /// Identities currently tracked.
    pub fn tracked(&self) -> usize {
        self.windows.lock().len()
    }
}

/// Shared gate handle.
pub type SharedAdmissionGate = Arc<AdmissionGate>;
