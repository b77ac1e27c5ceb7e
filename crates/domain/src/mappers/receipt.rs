//! Receipt mapping from the combined transaction payload.

use super::{normalize_access_list, normalize_fee_ratio, require, ReceiptLogMapper};
use crate::{records::Receipt, wire::TransactionPayload};
use alloy_primitives::U256;
use klay_primitives::{
    hex_to_u256, hex_to_u64, parse_address, parse_hash, parse_opt_address, parse_opt_hash,
    BlockTime, ValidationError,
};
use tracing::warn;

/// Maps the receipt fields of a consensus-info transaction payload into
/// [Receipt] records.
#[derive(Debug, Default)]
pub struct ReceiptMapper {
    enrich: bool,
    log_mapper: Option<ReceiptLogMapper>,
}

impl ReceiptMapper {
    /// Creates a mapper. Receipts have no enriched flavor of their own; the
    /// flag propagates to the owned log mapper.
    pub const fn new(enrich: bool) -> Self {
        Self { enrich, log_mapper: None }
    }

    /// Whether this mapper participates in an enriched mapper tree.
    pub const fn enrich(&self) -> bool {
        self.enrich
    }

    pub(crate) fn set_enrich(&mut self, enrich: bool) {
        self.enrich = enrich;
        if let Some(log_mapper) = &mut self.log_mapper {
            log_mapper.set_enrich(enrich);
        }
    }

    /// Registers the child mapper for the receipt's logs.
    pub fn with_log_mapper(mut self, mut mapper: ReceiptLogMapper) -> Self {
        if mapper.enrich() != self.enrich {
            warn!(target: "mapper", "child mapper enrichness differs from parent; forcing parent value");
            mapper.set_enrich(self.enrich);
        }
        self.log_mapper = Some(mapper);
        self
    }

    /// Maps the receipt portion of a transaction payload, including its logs
    /// when a log mapper is registered.
    pub fn map(
        &self,
        payload: &TransactionPayload,
        block_timestamp: BlockTime,
    ) -> Result<Receipt, ValidationError> {
        let gas_price = hex_to_u256(payload.gas_price.as_deref())?.unwrap_or(U256::ZERO);
        let fee_payer = parse_opt_address(payload.fee_payer.as_deref())?;
        let receipt_status = hex_to_u64(payload.status.as_deref())?;

        let logs = match &self.log_mapper {
            Some(mapper) => payload
                .logs
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|log| mapper.map(log, block_timestamp, receipt_status))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(Receipt {
            transaction_hash: parse_hash(
                payload.transaction_hash.as_deref().or(payload.hash.as_deref()),
            )?,
            transaction_index: require(
                hex_to_u64(payload.transaction_index.as_deref().or(payload.index.as_deref()))?,
                "receipt.transaction_index",
            )?,
            block_hash: parse_hash(payload.block_hash.as_deref())?,
            block_number: require(
                hex_to_u64(payload.block_number.as_deref())?,
                "receipt.block_number",
            )?,
            gas: hex_to_u64(payload.gas.as_deref())?.unwrap_or(0),
            gas_price,
            gas_used: hex_to_u64(payload.gas_used.as_deref())?,
            effective_gas_price: hex_to_u256(payload.effective_gas_price.as_deref())?
                .unwrap_or(gas_price),
            contract_address: parse_opt_address(payload.contract_address.as_deref())?,
            logs_bloom: payload.logs_bloom.clone(),
            nonce: require(hex_to_u64(payload.nonce.as_deref())?, "receipt.nonce")?,
            fee_payer,
            fee_payer_signatures: payload.fee_payer_signatures.clone(),
            fee_ratio: normalize_fee_ratio(
                fee_payer.is_some(),
                hex_to_u64(payload.fee_ratio.as_deref())?,
            )?,
            code_format: payload.code_format.clone(),
            human_readable: payload.human_readable,
            tx_error: payload.tx_error.clone(),
            key: payload.key.clone(),
            input_data: payload.input.clone(),
            from_address: parse_address(payload.from.as_deref())?,
            to_address: parse_opt_address(payload.to.as_deref())?,
            type_name: payload.type_name.clone(),
            type_int: payload.type_int,
            sender_tx_hash: parse_opt_hash(payload.sender_tx_hash.as_deref())?,
            signatures: payload.signatures.clone(),
            status: receipt_status,
            value: hex_to_u256(payload.value.as_deref())?,
            input_json: payload.input_json.clone(),
            access_list: normalize_access_list(payload.access_list.clone()),
            chain_id: hex_to_u64(payload.chain_id.as_deref())?,
            max_priority_fee_per_gas: hex_to_u256(payload.max_priority_fee_per_gas.as_deref())?,
            max_fee_per_gas: hex_to_u256(payload.max_fee_per_gas.as_deref())?,
            logs,
        })
    }
}
