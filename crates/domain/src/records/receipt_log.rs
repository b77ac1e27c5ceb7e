//! The receipt log record.

use alloy_primitives::{Address, B256};
use klay_primitives::BlockTime;
use serde::Serialize;

/// A single log entry of a transaction receipt.
#[derive(Clone, Debug, Serialize)]
pub struct ReceiptLog {
    /// Position within the block.
    pub log_index: u64,
    /// Owning transaction hash.
    pub transaction_hash: B256,
    /// Owning transaction index.
    pub transaction_index: u64,
    /// Containing block hash.
    pub block_hash: B256,
    /// Containing block number.
    pub block_number: u64,
    /// Emitting contract address.
    pub address: Address,
    /// ABI-encoded event data.
    pub data: Option<String>,
    /// Indexed event topics, 0-4 entries.
    pub topics: Vec<B256>,
    /// Chain reorg flag; always false on finalized ranges.
    pub removed: Option<bool>,
    /// Inherited block and transaction context.
    #[serde(flatten)]
    pub enrichment: Option<LogEnrichment>,
}

/// Context a log inherits from its block and owning transaction.
#[derive(Clone, Debug, Serialize)]
pub struct LogEnrichment {
    /// Owning block timestamp.
    pub block_timestamp: BlockTime,
    /// Float companion of the timestamp.
    pub block_unix_timestamp: f64,
    /// Receipt status of the owning transaction.
    pub transaction_receipt_status: Option<u64>,
}

impl LogEnrichment {
    /// Builds the enrichment from the owning block and transaction.
    pub fn new(block_timestamp: BlockTime, transaction_receipt_status: Option<u64>) -> Self {
        Self {
            block_timestamp,
            block_unix_timestamp: block_timestamp.unix(),
            transaction_receipt_status,
        }
    }
}
