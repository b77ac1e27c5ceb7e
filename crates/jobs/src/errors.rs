//! Job-level errors.

use klay_executor::WorkError;
use klay_export::ExportError;
use klay_primitives::ValidationError;
use klay_rpc::RpcErrorKind;
use klay_segment::SegmentError;
use thiserror::Error;

/// A failure of an export job.
#[derive(Error, Debug)]
pub enum JobError {
    /// The job was configured with unusable options.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// A record violated a domain invariant.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The RPC layer failed fatally.
    #[error(transparent)]
    Rpc(#[from] RpcErrorKind),
    /// Batch work failed after retries.
    #[error(transparent)]
    Work(#[from] WorkError),
    /// The exporter failed.
    #[error(transparent)]
    Export(#[from] ExportError),
    /// The Kafka segment source failed.
    #[error(transparent)]
    Segment(#[from] SegmentError),
    /// A wire payload did not decode.
    #[error("wire decode error: {0}")]
    WireDecode(#[from] serde_json::Error),
}

/// Maps an RPC severity onto the executor's retry policy.
pub(crate) fn work_error(err: RpcErrorKind) -> WorkError {
    if err.is_temporary() {
        WorkError::Retriable(err.to_string())
    } else {
        WorkError::Fatal(err.to_string())
    }
}

/// Domain failures are fatal for the batch.
pub(crate) fn fatal<E: std::fmt::Display>(err: E) -> WorkError {
    WorkError::Fatal(err.to_string())
}
