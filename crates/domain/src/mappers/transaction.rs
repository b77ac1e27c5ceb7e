//! Transaction payload mapping.

use super::{normalize_access_list, normalize_fee_ratio, require, ReceiptLogMapper};
use crate::{
    records::{Transaction, TransactionEnrichment},
    wire::TransactionPayload,
};
use alloy_primitives::U256;
use klay_primitives::{
    hex_to_u256, hex_to_u64, parse_address, parse_hash, parse_opt_address, parse_opt_hash,
    BlockTime, ValidationError,
};
use tracing::warn;

/// Maps transaction payloads into [Transaction] records.
#[derive(Debug, Default)]
pub struct TransactionMapper {
    enrich: bool,
    log_mapper: Option<ReceiptLogMapper>,
}

impl TransactionMapper {
    /// Creates a mapper producing raw or enriched records.
    pub const fn new(enrich: bool) -> Self {
        Self { enrich, log_mapper: None }
    }

    /// Whether this mapper produces enriched records.
    pub const fn enrich(&self) -> bool {
        self.enrich
    }

    pub(crate) fn set_enrich(&mut self, enrich: bool) {
        self.enrich = enrich;
        if let Some(log_mapper) = &mut self.log_mapper {
            log_mapper.set_enrich(enrich);
        }
    }

    /// Registers the child mapper for the transaction's receipt logs.
    pub fn with_log_mapper(mut self, mut mapper: ReceiptLogMapper) -> Self {
        if mapper.enrich() != self.enrich {
            warn!(target: "mapper", "child mapper enrichness differs from parent; forcing parent value");
            mapper.set_enrich(self.enrich);
        }
        self.log_mapper = Some(mapper);
        self
    }

    /// Maps a transaction payload embedded in the given block.
    pub fn map(
        &self,
        payload: &TransactionPayload,
        block_timestamp: BlockTime,
    ) -> Result<Transaction, ValidationError> {
        let hash = payload.transaction_hash.as_deref().or(payload.hash.as_deref());
        let index = payload.transaction_index.as_deref().or(payload.index.as_deref());
        let receipt_status = hex_to_u64(payload.status.as_deref())?;
        let fee_payer = parse_opt_address(payload.fee_payer.as_deref())?;

        let logs = match &self.log_mapper {
            Some(mapper) if payload.has_receipt() => payload
                .logs
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|log| mapper.map(log, block_timestamp, receipt_status))
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        let enrichment = if self.enrich {
            Some(TransactionEnrichment::new(
                block_timestamp,
                hex_to_u64(payload.gas_used.as_deref())?,
                parse_opt_address(payload.contract_address.as_deref())?,
                receipt_status,
            ))
        } else {
            None
        };

        Ok(Transaction {
            hash: parse_hash(hash)?,
            nonce: require(hex_to_u64(payload.nonce.as_deref())?, "transaction.nonce")?,
            block_hash: parse_hash(payload.block_hash.as_deref())?,
            block_number: require(
                hex_to_u64(payload.block_number.as_deref())?,
                "transaction.block_number",
            )?,
            transaction_index: require(hex_to_u64(index)?, "transaction.transaction_index")?,
            from_address: parse_address(payload.from.as_deref())?,
            to_address: parse_opt_address(payload.to.as_deref())?,
            value: hex_to_u256(payload.value.as_deref())?.unwrap_or(U256::ZERO),
            gas: hex_to_u64(payload.gas.as_deref())?.unwrap_or(0),
            gas_price: hex_to_u256(payload.gas_price.as_deref())?.unwrap_or(U256::ZERO),
            input: payload.input.clone(),
            fee_payer,
            fee_payer_signatures: payload.fee_payer_signatures.clone(),
            fee_ratio: normalize_fee_ratio(
                fee_payer.is_some(),
                hex_to_u64(payload.fee_ratio.as_deref())?,
            )?,
            sender_tx_hash: parse_opt_hash(payload.sender_tx_hash.as_deref())?,
            signatures: payload.signatures.clone(),
            tx_type: payload.type_name.clone(),
            tx_type_int: payload.type_int,
            max_priority_fee_per_gas: hex_to_u256(payload.max_priority_fee_per_gas.as_deref())?,
            max_fee_per_gas: hex_to_u256(payload.max_fee_per_gas.as_deref())?,
            access_list: normalize_access_list(payload.access_list.clone()),
            enrichment,
            logs,
        })
    }
}
