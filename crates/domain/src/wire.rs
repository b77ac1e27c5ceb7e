//! Wire shapes of the Klaytn JSON-RPC payloads this pipeline consumes.
//!
//! `klay_getBlockWithConsensusInfoByNumber` returns the block header, the
//! PoA consensus extensions, and the transactions with their receipt fields
//! and logs embedded, so a single payload type serves both the transaction
//! and the receipt mappers. Numeric fields arrive as 0x-prefixed hex strings
//! and stay untyped here; the mappers own conversion and validation.

use serde::Deserialize;
use serde_json::Value;

/// A block body with consensus info, as returned by
/// `klay_getBlockWithConsensusInfoByNumber`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPayload {
    /// Block number, hex.
    pub number: Option<String>,
    /// Block hash.
    pub hash: Option<String>,
    /// Parent block hash.
    pub parent_hash: Option<String>,
    /// Bloom filter over the block's logs.
    pub logs_bloom: Option<String>,
    /// Root of the transaction trie.
    pub transactions_root: Option<String>,
    /// Root of the state trie.
    pub state_root: Option<String>,
    /// Root of the receipts trie.
    pub receipts_root: Option<String>,
    /// Encoded block size in bytes, hex.
    pub size: Option<String>,
    /// Proposer extra data.
    pub extra_data: Option<String>,
    /// Total gas used by the block, hex.
    pub gas_used: Option<String>,
    /// Unix timestamp, whole seconds, hex.
    pub timestamp: Option<String>,
    /// Fraction-of-second field in milliseconds, hex.
    #[serde(rename = "timestampFoS")]
    pub timestamp_fos: Option<String>,
    /// PoA block score, hex. The wire key is all-lowercase.
    #[serde(rename = "blockscore")]
    pub block_score: Option<String>,
    /// Cumulative block score, hex.
    pub total_block_score: Option<String>,
    /// RLP-encoded governance data.
    pub governance_data: Option<String>,
    /// RLP-encoded vote data.
    pub vote_data: Option<String>,
    /// Addresses of the consensus committee. Null on the genesis block.
    pub committee: Option<Vec<String>>,
    /// Block proposer address.
    pub proposer: Option<String>,
    /// Block reward recipient.
    pub reward: Option<String>,
    /// EIP-1559 base fee, hex. Absent before the magma hardfork.
    pub base_fee_per_gas: Option<String>,
    /// Transactions with embedded receipt fields.
    #[serde(default)]
    pub transactions: Vec<TransactionPayload>,
}

impl BlockPayload {
    /// Whether the payload carries consensus info, and therefore receipt
    /// fields on its transactions. `klay_getBlockByNumber` responses do not.
    pub fn is_full_block(&self) -> bool {
        self.proposer.is_some() || self.committee.is_some()
    }
}

/// A transaction as embedded in a consensus-info block payload, carrying
/// both transaction and receipt fields.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    /// Transaction hash as named in receipt context.
    pub transaction_hash: Option<String>,
    /// Transaction hash as named in transaction context.
    pub hash: Option<String>,
    /// Sender nonce, hex.
    pub nonce: Option<String>,
    /// Containing block hash.
    pub block_hash: Option<String>,
    /// Containing block number, hex.
    pub block_number: Option<String>,
    /// Position within the block, hex.
    pub transaction_index: Option<String>,
    /// Position within the block under the alternate wire key.
    pub index: Option<String>,
    /// Sender address.
    pub from: Option<String>,
    /// Recipient address; null for contract creation.
    pub to: Option<String>,
    /// Transferred value in peb, hex.
    pub value: Option<String>,
    /// Gas limit, hex.
    pub gas: Option<String>,
    /// Gas price, hex.
    pub gas_price: Option<String>,
    /// Call data.
    pub input: Option<String>,
    /// Fee-delegation payer address.
    pub fee_payer: Option<String>,
    /// Fee payer signature objects.
    pub fee_payer_signatures: Option<Value>,
    /// Fee-delegation ratio, hex, 0-100.
    pub fee_ratio: Option<String>,
    /// Hash of the sender-signed portion.
    pub sender_tx_hash: Option<String>,
    /// Sender signature objects.
    pub signatures: Option<Value>,
    /// Klaytn transaction type name.
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Klaytn transaction type as an integer.
    pub type_int: Option<u64>,
    /// EIP-1559 priority fee cap, hex.
    pub max_priority_fee_per_gas: Option<String>,
    /// EIP-1559 fee cap, hex.
    pub max_fee_per_gas: Option<String>,
    /// EIP-2930 access list.
    pub access_list: Option<Value>,
    /// Receipt: gas consumed, hex.
    pub gas_used: Option<String>,
    /// Receipt: effective gas price, hex.
    pub effective_gas_price: Option<String>,
    /// Receipt: execution status, hex 0/1.
    pub status: Option<String>,
    /// Receipt: created contract address.
    pub contract_address: Option<String>,
    /// Receipt: bloom filter over the logs.
    pub logs_bloom: Option<String>,
    /// Receipt: smart-contract code format.
    pub code_format: Option<String>,
    /// Receipt: human-readable address flag.
    pub human_readable: Option<bool>,
    /// Receipt: VM error on failure.
    pub tx_error: Option<String>,
    /// Receipt: account key update payload.
    pub key: Option<String>,
    /// Receipt: decoded input object.
    #[serde(rename = "inputJSON")]
    pub input_json: Option<Value>,
    /// Chain id, hex.
    pub chain_id: Option<String>,
    /// Receipt logs. Presence marks a transaction-with-receipt payload.
    pub logs: Option<Vec<LogPayload>>,
}

impl TransactionPayload {
    /// Whether receipt fields are populated on this payload.
    pub const fn has_receipt(&self) -> bool {
        self.logs.is_some()
    }
}

/// A receipt log entry.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPayload {
    /// Position within the block, hex.
    pub log_index: Option<String>,
    /// Owning transaction hash.
    pub transaction_hash: Option<String>,
    /// Owning transaction index, hex.
    pub transaction_index: Option<String>,
    /// Containing block hash.
    pub block_hash: Option<String>,
    /// Containing block number, hex.
    pub block_number: Option<String>,
    /// Emitting contract address.
    pub address: Option<String>,
    /// ABI-encoded event data.
    pub data: Option<String>,
    /// Indexed event topics, 0-4 entries.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Chain reorg flag; always false on finalized ranges.
    pub removed: Option<bool>,
}

/// One call frame of a `debug_traceBlockByNumber` transaction trace.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceFrame {
    /// Frame type. A string (`CALL`, `CREATE`, ...) on real frames; the
    /// integer 0 on the empty marker shape.
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    /// Caller address.
    pub from: Option<String>,
    /// Callee address; null on some creation shapes.
    pub to: Option<String>,
    /// Value transferred, hex.
    pub value: Option<String>,
    /// Gas provided to the frame, hex.
    pub gas: Option<String>,
    /// Gas used by the frame, hex.
    pub gas_used: Option<String>,
    /// Call data.
    pub input: Option<String>,
    /// Return data.
    pub output: Option<String>,
    /// Execution duration; the integer 0 on the empty marker shape.
    pub time: Option<Value>,
    /// VM error, absent on success.
    pub error: Option<String>,
    /// Child call frames.
    #[serde(default)]
    pub calls: Vec<TraceFrame>,
}

impl TraceFrame {
    /// Whether this frame matches the empty-trace marker the node emits for
    /// transactions it has no trace for.
    pub fn is_empty_marker(&self) -> bool {
        fn is_hex(value: &Option<String>, expected: &str) -> bool {
            value.as_deref() == Some(expected)
        }
        self.kind.as_ref().is_some_and(|kind| kind == &Value::from(0))
            && is_hex(&self.from, "0x")
            && is_hex(&self.to, "0x")
            && is_hex(&self.value, "0x0")
            && is_hex(&self.gas, "0x0")
            && is_hex(&self.gas_used, "0x0")
            && is_hex(&self.input, "0x")
            && is_hex(&self.output, "0x")
            && self.time.as_ref().is_some_and(|time| time == &Value::from(0))
    }

    /// The frame type as a lowercase string, when it is a string.
    pub fn kind_str(&self) -> Option<String> {
        self.kind.as_ref().and_then(Value::as_str).map(str::to_ascii_lowercase)
    }
}

/// One entry of a `debug_traceBlockByNumber` response: the trace of a
/// single transaction, wrapped in a result object.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceResultEntry {
    /// The transaction's root call frame; absent when the node failed to
    /// trace it.
    pub result: Option<TraceFrame>,
}

/// The payload shape delivered on the trace Kafka topic: one block's worth
/// of transaction traces.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceBlockPayload {
    /// The traced block number.
    pub block_number: u64,
    /// Per-transaction root frames, by transaction index.
    ///
    /// `debug_traceBlockByNumber` wraps each entry as `{"result": frame}`;
    /// the Kafka producer strips the wrapper.
    pub result: Vec<Option<TraceFrame>>,
}
