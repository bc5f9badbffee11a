//! Background workers: retention enforcement and metrics snapshots.

pub mod retention;
pub mod scheduler;

pub use retention::{RetentionReport, RetentionSweeper};
pub use scheduler::{WorkerConfig, WorkerScheduler};
