//! Validation errors shared across the workspace.

use thiserror::Error;

/// An invariant violation detected while constructing or mutating a record.
///
/// Validation failures are fatal for the record that produced them; the
/// surrounding batch surfaces them as fatal to the driver.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A quantity field did not parse as a 0x-prefixed base-16 integer.
    #[error("invalid hex quantity: {0}")]
    InvalidHex(String),
    /// An address field was not a 42-character 0x-prefixed hex string.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// A hash field was not a 66-character 0x-prefixed hex string.
    #[error("invalid hash: {0}")]
    InvalidHash(String),
    /// A required field was absent from the wire payload.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// A fee ratio outside the inclusive [0, 100] range.
    #[error("fee ratio out of range: {0}")]
    FeeRatioOutOfRange(u64),
    /// A status value other than 0 or 1.
    #[error("status must be 0 or 1, got {0}")]
    StatusOutOfRange(u64),
    /// A timestamp that does not represent a valid UTC instant.
    #[error("timestamp out of range: {secs}s + {fos}ms")]
    TimestampOutOfRange {
        /// Whole seconds since the unix epoch.
        secs: u64,
        /// The fraction-of-second field, in milliseconds.
        fos: u64,
    },
    /// A block range whose end precedes its start.
    #[error("range end {end} precedes range start {start}")]
    InvalidRange {
        /// Inclusive range start.
        start: u64,
        /// Inclusive range end.
        end: u64,
    },
    /// A contract creation trace with no target address.
    #[error("contract creation trace must have a to_address")]
    MissingCreationTarget,
    /// A trace block whose per-transaction traces do not line up with the
    /// block body's transactions.
    #[error("trace block carries {traces} traces but the block has {transactions} transactions")]
    TraceCardinalityMismatch {
        /// Number of per-transaction traces in the trace block.
        traces: usize,
        /// Number of transactions in the block body.
        transactions: usize,
    },
    /// An enrichment was attempted with the wrong parent record.
    #[error("cannot enrich {child} from {parent}")]
    EnrichmentMismatch {
        /// The record being enriched.
        child: &'static str,
        /// The parent that was offered.
        parent: &'static str,
    },
}
