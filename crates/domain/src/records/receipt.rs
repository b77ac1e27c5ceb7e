//! The receipt record.

use super::ReceiptLog;
use alloy_primitives::{Address, B256, U256};
use serde::Serialize;
use serde_json::Value;

/// A transaction receipt.
///
/// Klaytn's consensus-info block payload embeds the receipt fields directly
/// on each transaction, so this record mirrors the transaction's
/// fee-delegation fields alongside the execution results.
#[derive(Clone, Debug, Serialize)]
pub struct Receipt {
    /// Owning transaction hash.
    pub transaction_hash: B256,
    /// Owning transaction index.
    pub transaction_index: u64,
    /// Containing block hash.
    pub block_hash: B256,
    /// Containing block number.
    pub block_number: u64,
    /// Gas limit of the transaction.
    pub gas: u64,
    /// Gas price in peb.
    #[serde(with = "klay_primitives::num")]
    pub gas_price: U256,
    /// Gas consumed by execution.
    pub gas_used: Option<u64>,
    /// Effective gas price; falls back to `gas_price` when absent.
    #[serde(with = "klay_primitives::num")]
    pub effective_gas_price: U256,
    /// Created contract address, on creation transactions.
    pub contract_address: Option<Address>,
    /// Bloom filter over the logs.
    pub logs_bloom: Option<String>,
    /// Sender nonce.
    pub nonce: u64,
    /// Fee-delegation payer.
    pub fee_payer: Option<Address>,
    /// Fee payer signature objects.
    pub fee_payer_signatures: Option<Value>,
    /// Fee-delegation ratio, normalized as on the transaction record.
    pub fee_ratio: u8,
    /// Smart-contract code format.
    pub code_format: Option<String>,
    /// Human-readable address flag.
    pub human_readable: Option<bool>,
    /// VM error on failure.
    pub tx_error: Option<String>,
    /// Account key update payload.
    pub key: Option<String>,
    /// Call data.
    pub input_data: Option<String>,
    /// Sender address.
    pub from_address: Address,
    /// Recipient address.
    pub to_address: Option<Address>,
    /// Klaytn transaction type name.
    pub type_name: Option<String>,
    /// Klaytn transaction type as an integer.
    pub type_int: Option<u64>,
    /// Hash of the sender-signed portion.
    pub sender_tx_hash: Option<B256>,
    /// Sender signature objects.
    pub signatures: Option<Value>,
    /// Execution status, 0 or 1.
    pub status: Option<u64>,
    /// Transferred value in peb.
    #[serde(with = "klay_primitives::num::opt")]
    pub value: Option<U256>,
    /// Decoded input object.
    pub input_json: Option<Value>,
    /// EIP-2930 access list.
    pub access_list: Option<Value>,
    /// Chain id.
    pub chain_id: Option<u64>,
    /// EIP-1559 priority fee cap.
    #[serde(with = "klay_primitives::num::opt")]
    pub max_priority_fee_per_gas: Option<U256>,
    /// EIP-1559 fee cap.
    #[serde(with = "klay_primitives::num::opt")]
    pub max_fee_per_gas: Option<U256>,
    /// Owned receipt logs; exported individually.
    #[serde(skip)]
    pub logs: Vec<ReceiptLog>,
}
