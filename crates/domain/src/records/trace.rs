//! The trace record.

use alloy_primitives::{Address, B256, U256};
use klay_primitives::{BlockTime, ValidationError};
use serde::Serialize;

/// A single call frame within a transaction's execution trace.
#[derive(Clone, Debug, Serialize)]
pub struct Trace {
    /// Containing block number.
    pub block_number: u64,
    /// Owning transaction hash.
    pub transaction_hash: Option<B256>,
    /// Owning transaction index.
    pub transaction_index: u64,
    /// Pre-order position within the transaction's trace tree.
    pub trace_index: u64,
    /// Caller address.
    pub from_address: Option<Address>,
    /// Callee address; absent on some creation shapes.
    pub to_address: Option<Address>,
    /// Value transferred in peb.
    #[serde(with = "klay_primitives::num")]
    pub value: U256,
    /// Call data.
    pub input: Option<String>,
    /// Return data.
    pub output: Option<String>,
    /// Normalized frame type: `call`, `create`, `suicide`, ...
    pub trace_type: String,
    /// The original call variant when `trace_type` is `call`.
    pub call_type: Option<String>,
    /// Gas provided to the frame.
    pub gas: u64,
    /// Gas used by the frame.
    pub gas_used: u64,
    /// Number of direct child frames.
    pub subtraces: u64,
    /// Path of child indices from the transaction root; empty at the root.
    pub trace_address: Vec<u64>,
    /// VM error, absent on success.
    pub error: Option<String>,
    /// Effective status: the receipt status gated by every ancestor frame.
    pub status: u8,
    /// Inherited block and transaction context.
    #[serde(flatten)]
    pub enrichment: Option<TraceEnrichment>,
}

impl Trace {
    /// Whether this frame created a contract that is live at the end of the
    /// transaction: a `create` frame with a target address and status 1.
    pub fn is_contract_creation(&self) -> bool {
        self.trace_type == "create" && self.to_address.is_some() && self.status == 1
    }

    /// Validates a status value into the {0, 1} domain.
    pub const fn validate_status(status: u64) -> Result<u8, ValidationError> {
        match status {
            0 => Ok(0),
            1 => Ok(1),
            other => Err(ValidationError::StatusOutOfRange(other)),
        }
    }
}

/// Context a trace inherits from its block and owning transaction.
#[derive(Clone, Debug, Serialize)]
pub struct TraceEnrichment {
    /// Containing block hash.
    pub block_hash: B256,
    /// Owning block timestamp.
    pub block_timestamp: BlockTime,
    /// Float companion of the timestamp.
    pub block_unix_timestamp: f64,
    /// Receipt status of the owning transaction.
    pub transaction_receipt_status: u64,
}

impl TraceEnrichment {
    /// Builds the enrichment from the owning block and transaction.
    pub fn new(block_hash: B256, block_timestamp: BlockTime, transaction_receipt_status: u64) -> Self {
        Self {
            block_hash,
            block_timestamp,
            block_unix_timestamp: block_timestamp.unix(),
            transaction_receipt_status,
        }
    }
}
