//! Write sink seam.

use async_trait::async_trait;
use pulse_core::{EventRecord, Result};

/// Destination for flushed batches.
///
/// The row store behind this is an opaque collaborator; it owns its own
/// timeouts. The buffer never retries a batch more than once.
#[async_trait]
pub trait WriteSink: Send + Sync {
    /// Writes one batch. A batch either lands or errors as a unit.
    async fn write_batch(&self, records: &[EventRecord]) -> Result<()>;

    /// Best-effort reachability signal for health reporting.
    fn is_healthy(&self) -> bool {
        true
    }
}
