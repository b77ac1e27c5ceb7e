//! The token record.

use super::{Contract, ContractEnrichment};
use alloy_primitives::{Address, B256, U256};
use klay_primitives::BlockTime;
use serde::Serialize;

/// Metadata for a contract classified as a token standard.
///
/// Every metadata field is best-effort: a contract that reverts on
/// `symbol()` still yields a token record with `symbol` null.
#[derive(Clone, Debug, Serialize)]
pub struct Token {
    /// The token contract address.
    pub address: Address,
    /// `symbol()`, NUL-stripped.
    pub symbol: Option<String>,
    /// `name()`, NUL-stripped.
    pub name: Option<String>,
    /// `decimals()`.
    pub decimals: Option<u8>,
    /// `totalSupply()`.
    #[serde(with = "klay_primitives::num::opt")]
    pub total_supply: Option<U256>,
    /// Block the contract was created in.
    pub block_number: u64,
    /// Inherited classification and creation context.
    #[serde(flatten)]
    pub enrichment: Option<TokenEnrichment>,
}

impl Token {
    /// Builds a token record from its classified contract and fetched
    /// metadata. Enrichment is carried over when the contract has it.
    pub fn from_contract(
        contract: &Contract,
        symbol: Option<String>,
        name: Option<String>,
        decimals: Option<u8>,
        total_supply: Option<U256>,
    ) -> Self {
        let enrichment = contract
            .enrichment
            .as_ref()
            .map(|inherited| TokenEnrichment::new(contract, inherited));
        Self {
            address: contract.address,
            symbol,
            name,
            decimals,
            total_supply,
            block_number: contract.block_number,
            enrichment,
        }
    }
}

/// Classification and creation context a token inherits from its contract.
#[derive(Clone, Debug, Serialize)]
pub struct TokenEnrichment {
    /// Sorted unique 4-byte function selectors of the contract.
    pub function_sighashes: Vec<String>,
    /// Whether the contract satisfies the ERC-20 interface.
    pub is_erc20: bool,
    /// Whether the contract satisfies the ERC-721 interface.
    pub is_erc721: bool,
    /// Whether the contract satisfies the ERC-1155 interface.
    pub is_erc1155: bool,
    /// Creation block hash.
    pub block_hash: B256,
    /// Creation block timestamp.
    pub block_timestamp: BlockTime,
    /// Float companion of the timestamp.
    pub block_unix_timestamp: f64,
    /// Creating transaction hash.
    pub transaction_hash: Option<B256>,
    /// Creating transaction index.
    pub transaction_index: u64,
    /// Receipt status of the creating transaction.
    pub transaction_receipt_status: u64,
    /// Pre-order index of the creation trace.
    pub trace_index: u64,
    /// Status of the creation trace.
    pub trace_status: u8,
    /// The creation trace's caller.
    pub creator_address: Option<Address>,
}

impl TokenEnrichment {
    fn new(contract: &Contract, inherited: &ContractEnrichment) -> Self {
        Self {
            function_sighashes: contract.function_sighashes.clone(),
            is_erc20: contract.is_erc20,
            is_erc721: contract.is_erc721,
            is_erc1155: contract.is_erc1155,
            block_hash: inherited.block_hash,
            block_timestamp: inherited.block_timestamp,
            block_unix_timestamp: inherited.block_unix_timestamp,
            transaction_hash: inherited.transaction_hash,
            transaction_index: inherited.transaction_index,
            transaction_receipt_status: inherited.transaction_receipt_status,
            trace_index: inherited.trace_index,
            trace_status: inherited.trace_status,
            creator_address: inherited.creator_address,
        }
    }
}
