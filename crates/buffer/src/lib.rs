//! Non-blocking ingest buffer.
//!
//! Producers call [`IngestBuffer::submit`] and never wait on the write
//! sink. Records coalesce in memory and flush in batches, either when the
//! pending count crosses a threshold or on a timer, whichever comes first.

pub mod ingest;
pub mod sink;

pub use ingest::{BufferConfig, IngestBuffer};
pub use sink::WriteSink;
