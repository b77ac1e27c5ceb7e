//! Executor error types.

use thiserror::Error;

/// A failure inside a unit of batch work, sorted by severity.
///
/// The executor owns the retry policy: temporary failures shrink the batch
/// and try again, fatal failures abort the run.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum WorkError {
    /// A transient failure; the batch may succeed when retried, possibly in
    /// smaller pieces.
    #[error("retriable work error: {0}")]
    Retriable(String),
    /// A permanent failure; surfaces to the driver.
    #[error("fatal work error: {0}")]
    Fatal(String),
}

impl WorkError {
    /// Whether the executor should retry the failing batch.
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Retriable(_))
    }
}
