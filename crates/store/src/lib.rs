//! ClickHouse adapter for the opaque row-store collaborator.
//!
//! The core only ever talks to storage through the sink seams: batched
//! writes from the ingest buffer, named aggregate queries from the cache
//! layer, and cutoff deletions from the retention sweeper.

pub mod client;
pub mod config;
pub mod read;
pub mod schema;
pub mod write;

pub use client::StoreClient;
pub use config::StoreConfig;
pub use read::{ClickHouseReadSink, ReadSink};
pub use schema::init_schema;
pub use write::ClickHouseWriteSink;
