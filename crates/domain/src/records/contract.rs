//! The contract record.

use super::Trace;
use alloy_primitives::{Address, B256};
use klay_primitives::{BlockTime, ValidationError};
use serde::Serialize;

/// A contract observed at its creation trace.
#[derive(Clone, Debug, Serialize)]
pub struct Contract {
    /// The contract address.
    pub address: Address,
    /// Deployed runtime bytecode.
    pub bytecode: Option<String>,
    /// Sorted unique 4-byte function selectors found in the bytecode.
    pub function_sighashes: Vec<String>,
    /// Whether the contract satisfies the ERC-20 interface.
    pub is_erc20: bool,
    /// Whether the contract satisfies the ERC-721 interface.
    pub is_erc721: bool,
    /// Whether the contract satisfies the ERC-1155 interface.
    pub is_erc1155: bool,
    /// Block the contract was created in.
    pub block_number: u64,
    /// Inherited creation context.
    #[serde(flatten)]
    pub enrichment: Option<ContractEnrichment>,
}

impl Contract {
    /// Whether the contract matched any of the supported token standards.
    pub const fn is_token(&self) -> bool {
        self.is_erc20 || self.is_erc721 || self.is_erc1155
    }

    /// Builds the enrichment context for a contract from its creation trace.
    ///
    /// The trace must itself be enriched; a raw trace cannot supply block
    /// context.
    pub fn enrichment_from_trace(trace: &Trace) -> Result<ContractEnrichment, ValidationError> {
        let inherited = trace.enrichment.as_ref().ok_or(ValidationError::EnrichmentMismatch {
            child: "contract",
            parent: "raw trace",
        })?;
        Ok(ContractEnrichment {
            block_hash: inherited.block_hash,
            block_timestamp: inherited.block_timestamp,
            block_unix_timestamp: inherited.block_unix_timestamp,
            transaction_hash: trace.transaction_hash,
            transaction_index: trace.transaction_index,
            transaction_receipt_status: inherited.transaction_receipt_status,
            trace_index: trace.trace_index,
            trace_status: trace.status,
            creator_address: trace.from_address,
        })
    }
}

/// Creation context a contract inherits from its creation trace.
#[derive(Clone, Debug, Serialize)]
pub struct ContractEnrichment {
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
