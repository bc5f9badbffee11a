//! Size and rate limits for the analytics core.
//!
//! MEMORY SAFETY: the buffer cap and batch bounds keep the working set
//! predictable regardless of producer volume or sink availability.

// === Ingest Buffer ===

/// Hard cap on buffered records. When full, the oldest are dropped.
pub const BUFFER_HARD_CAP: usize = 10_000;

/// Pending count that triggers an immediate flush.
pub const FLUSH_BATCH_THRESHOLD: usize = 500;

/// Timer-driven flush interval in milliseconds.
pub const FLUSH_INTERVAL_MS: u64 = 5_000;

/// Maximum events accepted in one collect request.
pub const MAX_COLLECT_EVENTS: usize = 1_000;

// === Event Record fields ===

/// Page path max length.
pub const MAX_PATH_LEN: usize = 2_000;

/// Session identifier max length (hashed identifiers are 64 hex chars).
pub const MAX_SESSION_ID_LEN: usize = 128;

/// User agent string max length.
/// Browser UAs: 100-300 typical, 500+ with extensions.
pub const MAX_USER_AGENT_LEN: usize = 512;

/// IP address max length (IPv6 = 45 chars).
pub const MAX_IP_LEN: usize = 45;

/// Referrer URL max length. Matches the HTTP Referer header limit.
pub const MAX_REFERRER_LEN: usize = 2_048;

/// Time-on-page upper bound in seconds (one day).
pub const MAX_TIME_ON_PAGE_SECS: f64 = 86_400.0;

// === Query Cache ===

/// Default TTL for cached analytics reads, in seconds.
pub const DEFAULT_STATS_TTL_SECS: u64 = 300;

// === Admission Gate ===

/// Fixed window length in seconds.
pub const GATE_WINDOW_SECS: u64 = 900;

/// Failed attempts tolerated per identity per window.
pub const GATE_MAX_FAILURES: u32 = 5;

// === Retention ===

/// Sweep interval in seconds.
pub const RETENTION_SWEEP_INTERVAL_SECS: u64 = 3_600;
