#![recursion_limit = "256"]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod wire;

mod records;
pub use records::{
    Block, Contract, ContractEnrichment, ExportRecord, LogEnrichment, Receipt, ReceiptLog, Token,
    TokenEnrichment, TokenTransfer, TraceEnrichment, Trace, TransactionEnrichment, Transaction,
    TransferEnrichment,
};

pub mod mappers;

mod walker;
pub use walker::{correlate_trace_block, walk_trace_block, TraceBlock, TxTraceContext};

mod transfer;
pub use transfer::{
    extract_transfer_from_log, extract_transfers_from_log, ERC1155_TRANSFER_BATCH_TOPIC,
    ERC1155_TRANSFER_SINGLE_TOPIC, TRANSFER_EVENT_TOPIC,
};
