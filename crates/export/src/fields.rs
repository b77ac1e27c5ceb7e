//! Per-type output projections.
//!
//! Each item type exports a fixed field list in a fixed order; the enriched
//! flavors append the inherited context columns. Downstream schemas depend
//! on these orders.

use std::path::PathBuf;

/// A configured output for one item type.
#[derive(Clone, Debug)]
pub struct TypeSink {
    /// The record kind routed to this sink.
    pub kind: &'static str,
    /// Output file (single-file backend) or directory (rotating backend).
    pub path: PathBuf,
    /// The projected fields, in output order.
    pub fields: &'static [&'static str],
}

/// Block columns; blocks carry their timestamps in both flavors.
pub const BLOCK_FIELDS: &[&str] = &[
    "number",
    "hash",
    "parent_hash",
    "logs_bloom",
    "transactions_root",
    "state_root",
    "receipts_root",
    "size",
    "extra_data",
    "gas_used",
    "block_timestamp",
    "block_unix_timestamp",
    "transaction_count",
    "block_score",
    "total_block_score",
    "governance_data",
    "vote_data",
    "committee",
    "proposer",
    "reward_address",
    "base_fee_per_gas",
];

/// Raw transaction columns.
pub const TRANSACTION_FIELDS: &[&str] = &[
    "hash",
    "nonce",
    "block_hash",
    "block_number",
    "transaction_index",
    "from_address",
    "to_address",
    "value",
    "gas",
    "gas_price",
    "input",
    "fee_payer",
    "fee_payer_signatures",
    "fee_ratio",
    "sender_tx_hash",
    "signatures",
    "tx_type",
    "tx_type_int",
    "max_priority_fee_per_gas",
    "max_fee_per_gas",
    "access_list",
];

/// Enriched transaction columns.
pub const TRANSACTION_FIELDS_ENRICHED: &[&str] = &[
    "hash",
    "nonce",
    "block_hash",
    "block_number",
    "transaction_index",
    "from_address",
    "to_address",
    "value",
    "gas",
    "gas_price",
    "input",
    "fee_payer",
    "fee_payer_signatures",
    "fee_ratio",
    "sender_tx_hash",
    "signatures",
    "tx_type",
    "tx_type_int",
    "max_priority_fee_per_gas",
    "max_fee_per_gas",
    "access_list",
    "block_timestamp",
    "block_unix_timestamp",
    "receipt_gas_used",
    "receipt_contract_address",
    "receipt_status",
];

/// Receipt columns; identical in both flavors.
pub const RECEIPT_FIELDS: &[&str] = &[
    "transaction_hash",
    "transaction_index",
    "block_hash",
    "block_number",
    "gas",
    "gas_price",
    "gas_used",
    "effective_gas_price",
    "contract_address",
    "logs_bloom",
    "nonce",
    "fee_payer",
    "fee_payer_signatures",
    "fee_ratio",
    "code_format",
    "human_readable",
    "tx_error",
    "key",
    "input_data",
    "from_address",
    "to_address",
    "type_name",
    "type_int",
    "sender_tx_hash",
    "signatures",
    "status",
    "value",
    "input_json",
    "access_list",
    "chain_id",
    "max_priority_fee_per_gas",
    "max_fee_per_gas",
];

/// Raw log columns.
pub const LOG_FIELDS: &[&str] = &[
    "block_hash",
    "block_number",
    "transaction_hash",
    "transaction_index",
    "log_index",
    "address",
    "data",
    "topics",
];

/// Enriched log columns.
pub const LOG_FIELDS_ENRICHED: &[&str] = &[
    "block_hash",
    "block_number",
    "transaction_hash",
    "transaction_index",
    "log_index",
    "address",
    "data",
    "topics",
    "block_timestamp",
    "block_unix_timestamp",
    "transaction_receipt_status",
];

/// Raw token transfer columns.
pub const TOKEN_TRANSFER_FIELDS: &[&str] = &[
    "token_address",
    "from_address",
    "to_address",
    "value",
    "block_hash",
    "block_number",
    "transaction_hash",
    "transaction_index",
    "log_index",
];

/// Enriched token transfer columns.
pub const TOKEN_TRANSFER_FIELDS_ENRICHED: &[&str] = &[
    "token_address",
    "from_address",
    "to_address",
    "value",
    "block_hash",
    "block_number",
    "transaction_hash",
    "transaction_index",
    "log_index",
    "block_timestamp",
    "block_unix_timestamp",
    "transaction_receipt_status",
];

/// Raw trace columns.
pub const TRACE_FIELDS: &[&str] = &[
    "block_number",
    "transaction_hash",
    "transaction_index",
    "trace_index",
    "from_address",
    "to_address",
    "value",
    "input",
    "output",
    "trace_type",
    "call_type",
    "gas",
    "gas_used",
    "subtraces",
    "trace_address",
    "error",
    "status",
];

/// Enriched trace columns.
pub const TRACE_FIELDS_ENRICHED: &[&str] = &[
    "block_number",
    "transaction_hash",
    "transaction_index",
    "trace_index",
    "from_address",
    "to_address",
    "value",
    "input",
    "output",
    "trace_type",
    "call_type",
    "gas",
    "gas_used",
    "subtraces",
    "trace_address",
    "error",
    "status",
    "block_hash",
    "block_timestamp",
    "block_unix_timestamp",
    "transaction_receipt_status",
];

/// Raw contract columns.
pub const CONTRACT_FIELDS: &[&str] = &[
    "address",
    "bytecode",
    "function_sighashes",
    "is_erc20",
    "is_erc721",
    "is_erc1155",
    "block_number",
];

/// Enriched contract columns.
pub const CONTRACT_FIELDS_ENRICHED: &[&str] = &[
    "address",
    "bytecode",
    "function_sighashes",
    "is_erc20",
    "is_erc721",
    "is_erc1155",
    "block_number",
    "block_hash",
    "block_timestamp",
    "block_unix_timestamp",
    "transaction_hash",
    "transaction_index",
    "transaction_receipt_status",
    "trace_index",
    "trace_status",
    "creator_address",
];

/// Raw token columns.
pub const TOKEN_FIELDS: &[&str] = &[
    "address",
    "symbol",
    "name",
    "decimals",
    "total_supply",
    "block_number",
];

/// Enriched token columns.
pub const TOKEN_FIELDS_ENRICHED: &[&str] = &[
    "address",
    "symbol",
    "name",
    "decimals",
    "total_supply",
    "block_number",
    "function_sighashes",
    "is_erc20",
    "is_erc721",
    "is_erc1155",
    "block_hash",
    "block_timestamp",
    "block_unix_timestamp",
    "transaction_hash",
    "transaction_index",
    "transaction_receipt_status",
    "trace_index",
    "trace_status",
    "creator_address",
];

/// Builds the sink set of the block-group job from its per-type outputs.
/// A `None` output disables that type.
pub fn block_group_sinks(
    blocks: Option<PathBuf>,
    transactions: Option<PathBuf>,
    receipts: Option<PathBuf>,
    logs: Option<PathBuf>,
    token_transfers: Option<PathBuf>,
    enrich: bool,
) -> Vec<TypeSink> {
    let mut sinks = Vec::new();
    if let Some(path) = blocks {
        sinks.push(TypeSink { kind: "block", path, fields: BLOCK_FIELDS });
    }
    if let Some(path) = transactions {
        sinks.push(TypeSink {
            kind: "transaction",
            path,
            fields: if enrich { TRANSACTION_FIELDS_ENRICHED } else { TRANSACTION_FIELDS },
        });
    }
    if let Some(path) = receipts {
        sinks.push(TypeSink { kind: "receipt", path, fields: RECEIPT_FIELDS });
    }
    if let Some(path) = logs {
        sinks.push(TypeSink {
            kind: "log",
            path,
            fields: if enrich { LOG_FIELDS_ENRICHED } else { LOG_FIELDS },
        });
    }
    if let Some(path) = token_transfers {
        sinks.push(TypeSink {
            kind: "token_transfer",
            path,
            fields: if enrich { TOKEN_TRANSFER_FIELDS_ENRICHED } else { TOKEN_TRANSFER_FIELDS },
        });
    }
    sinks
}

/// Builds the sink set of the trace-group jobs from their per-type outputs.
pub fn trace_group_sinks(
    traces: Option<PathBuf>,
    contracts: Option<PathBuf>,
    tokens: Option<PathBuf>,
    enrich: bool,
) -> Vec<TypeSink> {
    let mut sinks = Vec::new();
    if let Some(path) = traces {
        sinks.push(TypeSink {
            kind: "trace",
            path,
            fields: if enrich { TRACE_FIELDS_ENRICHED } else { TRACE_FIELDS },
        });
    }
    if let Some(path) = contracts {
        sinks.push(TypeSink {
            kind: "contract",
            path,
            fields: if enrich { CONTRACT_FIELDS_ENRICHED } else { CONTRACT_FIELDS },
        });
    }
    if let Some(path) = tokens {
        sinks.push(TypeSink {
            kind: "token",
            path,
            fields: if enrich { TOKEN_FIELDS_ENRICHED } else { TOKEN_FIELDS },
        });
    }
    sinks
}
