//! The block record.

use super::{Receipt, Transaction};
use alloy_primitives::{Address, B256, U256};
use klay_primitives::BlockTime;
use serde::Serialize;

/// A block header with its Klaytn PoA consensus extensions.
///
/// Owns its transactions and receipts; the children are exported as separate
/// records and are skipped by the block's own serialization.
#[derive(Clone, Debug, Serialize)]
pub struct Block {
    /// Block number.
    pub number: u64,
    /// Block hash.
    pub hash: B256,
    /// Parent block hash.
    pub parent_hash: B256,
    /// Bloom filter over the block's logs.
    pub logs_bloom: Option<String>,
    /// Root of the transaction trie.
    pub transactions_root: B256,
    /// Root of the state trie.
    pub state_root: B256,
    /// Root of the receipts trie.
    pub receipts_root: B256,
    /// Encoded block size in bytes.
    pub size: u64,
    /// Proposer extra data.
    pub extra_data: Option<String>,
    /// Total gas used by the block.
    pub gas_used: u64,
    /// Block timestamp including the fraction-of-second field.
    pub block_timestamp: BlockTime,
    /// Float companion of the timestamp, seconds since the unix epoch.
    pub block_unix_timestamp: f64,
    /// Number of transactions in the block.
    pub transaction_count: u64,
    /// PoA block score.
    pub block_score: Option<u64>,
    /// Cumulative PoA block score.
    pub total_block_score: Option<u64>,
    /// RLP-encoded governance data.
    pub governance_data: Option<String>,
    /// RLP-encoded vote data.
    pub vote_data: Option<String>,
    /// Consensus committee addresses. Null on the genesis block.
    pub committee: Option<Vec<Address>>,
    /// Block proposer.
    pub proposer: Address,
    /// Block reward recipient.
    pub reward_address: Address,
    /// EIP-1559 base fee, absent before the magma hardfork.
    #[serde(with = "klay_primitives::num::opt")]
    pub base_fee_per_gas: Option<U256>,
    /// Owned transactions; exported individually.
    #[serde(skip)]
    pub transactions: Vec<Transaction>,
    /// Owned receipts; exported individually.
    #[serde(skip)]
    pub receipts: Vec<Receipt>,
}
