//! The typed records this pipeline exports.
//!
//! Every record comes in a raw flavor, derived from the wire payload alone,
//! and an enriched flavor that additionally carries context inherited from
//! the owning parent (block hash and timestamp, transaction receipt status).
//! Enrichment is an optional, flattened sub-struct rather than a separate
//! type; the exporters treat both flavors uniformly.

mod block;
pub use block::Block;

mod transaction;
pub use transaction::{Transaction, TransactionEnrichment};

mod receipt;
pub use receipt::Receipt;

mod receipt_log;
pub use receipt_log::{LogEnrichment, ReceiptLog};

mod token_transfer;
pub use token_transfer::{TokenTransfer, TransferEnrichment};

mod trace;
pub use trace::{Trace, TraceEnrichment};

mod contract;
pub use contract::{Contract, ContractEnrichment};

mod token;
pub use token::{Token, TokenEnrichment};

use serde::Serialize;

/// A record routed to the exporter, tagged with its item type.
///
/// The tag value is the routing key of the per-type writer registry and is
/// serialized as the `type` field of every output line.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportRecord {
    /// A block header with PoA consensus extensions.
    Block(Block),
    /// A transaction.
    Transaction(Transaction),
    /// A transaction receipt.
    Receipt(Receipt),
    /// A receipt log.
    Log(ReceiptLog),
    /// An ERC-20/721/1155 transfer decoded from a receipt log.
    TokenTransfer(TokenTransfer),
    /// A single call frame of an execution trace.
    Trace(Trace),
    /// A created contract.
    Contract(Contract),
    /// Token metadata for a created token contract.
    Token(Token),
}

impl ExportRecord {
    /// The routing key of this record's per-type writer.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Block(_) => "block",
            Self::Transaction(_) => "transaction",
            Self::Receipt(_) => "receipt",
            Self::Log(_) => "log",
            Self::TokenTransfer(_) => "token_transfer",
            Self::Trace(_) => "trace",
            Self::Contract(_) => "contract",
            Self::Token(_) => "token",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256, U256};

    #[test]
    fn serialized_tag_matches_the_routing_key() {
        let record = ExportRecord::TokenTransfer(TokenTransfer {
            token_address: Address::ZERO,
            from_address: Address::ZERO,
            to_address: Address::ZERO,
            value: U256::from(1u64),
            log_index: 0,
            transaction_hash: B256::ZERO,
            transaction_index: 0,
            block_hash: B256::ZERO,
            block_number: 0,
            enrichment: None,
        });
        let serialized = serde_json::to_value(&record).unwrap();
        assert_eq!(serialized["type"], record.kind());
        // addresses and hashes stay 0x-prefixed lowercase hex
        assert_eq!(
            serialized["token_address"],
            "0x0000000000000000000000000000000000000000"
        );
        assert_eq!(serialized["transaction_hash"].as_str().unwrap().len(), 66);
    }
}
