//! The token transfer record.

use alloy_primitives::{Address, B256, U256};
use klay_primitives::BlockTime;
use serde::Serialize;

/// An ERC-20/721/1155 transfer decoded from a receipt log.
#[derive(Clone, Debug, Serialize)]
pub struct TokenTransfer {
    /// The token contract that emitted the event.
    pub token_address: Address,
    /// Transfer source.
    pub from_address: Address,
    /// Transfer destination.
    pub to_address: Address,
    /// Transferred amount (ERC-20) or token id (ERC-721).
    #[serde(with = "klay_primitives::num")]
    pub value: U256,
    /// Index of the source log within the block.
    pub log_index: u64,
    /// Owning transaction hash.
    pub transaction_hash: B256,
    /// Owning transaction index.
    pub transaction_index: u64,
    /// Containing block hash.
    pub block_hash: B256,
    /// Containing block number.
    pub block_number: u64,
    /// Inherited block and transaction context.
    #[serde(flatten)]
    pub enrichment: Option<TransferEnrichment>,
}

/// Context a transfer inherits from its source log.
#[derive(Clone, Debug, Serialize)]
pub struct TransferEnrichment {
    /// Owning block timestamp.
    pub block_timestamp: BlockTime,
    /// Float companion of the timestamp.
    pub block_unix_timestamp: f64,
    /// Receipt status of the owning transaction.
    pub transaction_receipt_status: Option<u64>,
}

impl TransferEnrichment {
    /// Builds the enrichment from the source log's inherited context.
    pub fn new(block_timestamp: BlockTime, transaction_receipt_status: Option<u64>) -> Self {
        Self {
            block_timestamp,
            block_unix_timestamp: block_timestamp.unix(),
            transaction_receipt_status,
        }
    }
}
