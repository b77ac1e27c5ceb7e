//! The exporter seam.

use crate::errors::ExportError;
use klay_domain::ExportRecord;

/// A multiplexed item exporter.
///
/// Implementations serialize `export_item` internally with a single coarse
/// lock; workers share one exporter and call it concurrently.
pub trait ItemExporter: Send + Sync {
    /// Prepares the per-type writers. Must be called before the first
    /// `export_item`.
    fn open(&self) -> Result<(), ExportError>;

    /// Routes one record to the writer configured for its type.
    fn export_item(&self, record: &ExportRecord) -> Result<(), ExportError>;

    /// Flushes every writer, emitting any buffered tail.
    fn close(&self) -> Result<(), ExportError>;
}
