//! Internal telemetry: tracing setup, metrics, and component health.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::{health, HealthReport, HealthRegistry};
pub use metrics::{metrics, Metrics, MetricsSnapshot};
pub use tracing_setup::{init_tracing, init_tracing_from_env};
