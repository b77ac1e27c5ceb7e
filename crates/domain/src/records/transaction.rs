//! The transaction record.

use super::ReceiptLog;
use alloy_primitives::{Address, B256, U256};
use klay_primitives::BlockTime;
use serde::Serialize;
use serde_json::Value;

/// A transaction, including the Klaytn fee-delegation fields.
#[derive(Clone, Debug, Serialize)]
pub struct Transaction {
    /// Transaction hash.
    pub hash: B256,
    /// Sender nonce.
    pub nonce: u64,
    /// Containing block hash.
    pub block_hash: B256,
    /// Containing block number.
    pub block_number: u64,
    /// Position within the block.
    pub transaction_index: u64,
    /// Sender address.
    pub from_address: Address,
    /// Recipient address; absent for contract creation.
    pub to_address: Option<Address>,
    /// Transferred value in peb.
    #[serde(with = "klay_primitives::num")]
    pub value: U256,
    /// Gas limit.
    pub gas: u64,
    /// Gas price in peb.
    #[serde(with = "klay_primitives::num")]
    pub gas_price: U256,
    /// Call data.
    pub input: Option<String>,
    /// Fee-delegation payer.
    pub fee_payer: Option<Address>,
    /// Fee payer signature objects, passed through as-is.
    pub fee_payer_signatures: Option<Value>,
    /// Fee-delegation ratio: 0 without a fee payer, 100 when a payer is
    /// present and the wire field is absent, else the wire value.
    pub fee_ratio: u8,
    /// Hash of the sender-signed portion.
    pub sender_tx_hash: Option<B256>,
    /// Sender signature objects, passed through as-is.
    pub signatures: Option<Value>,
    /// Klaytn transaction type name.
    pub tx_type: Option<String>,
    /// Klaytn transaction type as an integer.
    pub tx_type_int: Option<u64>,
    /// EIP-1559 priority fee cap.
    #[serde(with = "klay_primitives::num::opt")]
    pub max_priority_fee_per_gas: Option<U256>,
    /// EIP-1559 fee cap.
    #[serde(with = "klay_primitives::num::opt")]
    pub max_fee_per_gas: Option<U256>,
    /// EIP-2930 access list, storage keys renamed to snake case.
    pub access_list: Option<Value>,
    /// Inherited block and receipt context.
    #[serde(flatten)]
    pub enrichment: Option<TransactionEnrichment>,
    /// Receipt logs owned by this transaction; exported individually.
    #[serde(skip)]
    pub logs: Vec<ReceiptLog>,
}

/// Context a transaction inherits from its block and receipt.
#[derive(Clone, Debug, Serialize)]
pub struct TransactionEnrichment {
    /// Owning block timestamp.
    pub block_timestamp: BlockTime,
    /// Float companion of the timestamp.
    pub block_unix_timestamp: f64,
    /// Gas consumed per the receipt.
    pub receipt_gas_used: Option<u64>,
    /// Contract address created by this transaction, if any.
    pub receipt_contract_address: Option<Address>,
    /// Execution status per the receipt.
    pub receipt_status: Option<u64>,
}

impl TransactionEnrichment {
    /// Builds the enrichment from the owning block's timestamp and the
    /// receipt fields of the wire payload.
    pub fn new(
        block_timestamp: BlockTime,
        receipt_gas_used: Option<u64>,
        receipt_contract_address: Option<Address>,
        receipt_status: Option<u64>,
    ) -> Self {
        Self {
            block_timestamp,
            block_unix_timestamp: block_timestamp.unix(),
            receipt_gas_used,
            receipt_contract_address,
            receipt_status,
        }
    }
}
