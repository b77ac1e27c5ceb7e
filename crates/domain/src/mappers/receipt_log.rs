//! Receipt log mapping.

use super::require;
use crate::records::{LogEnrichment, ReceiptLog};
use crate::wire::LogPayload;
use klay_primitives::{hex_to_u64, parse_address, parse_hash, BlockTime, ValidationError};

/// Maps log payloads into [ReceiptLog] records.
#[derive(Debug, Default)]
pub struct ReceiptLogMapper {
    enrich: bool,
}

impl ReceiptLogMapper {
    /// Creates a mapper producing raw or enriched records.
    pub const fn new(enrich: bool) -> Self {
        Self { enrich }
    }

    /// Whether this mapper produces enriched records.
    pub const fn enrich(&self) -> bool {
        self.enrich
    }

    pub(crate) fn set_enrich(&mut self, enrich: bool) {
        self.enrich = enrich;
    }

    /// Maps a log payload with the context inherited from its owners.
    pub fn map(
        &self,
        payload: &LogPayload,
        block_timestamp: BlockTime,
        transaction_receipt_status: Option<u64>,
    ) -> Result<ReceiptLog, ValidationError> {
        let topics = payload
            .topics
            .iter()
            .map(|topic| parse_hash(Some(topic)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ReceiptLog {
            log_index: require(hex_to_u64(payload.log_index.as_deref())?, "log.log_index")?,
            transaction_hash: parse_hash(payload.transaction_hash.as_deref())?,
            transaction_index: require(
                hex_to_u64(payload.transaction_index.as_deref())?,
                "log.transaction_index",
            )?,
            block_hash: parse_hash(payload.block_hash.as_deref())?,
            block_number: require(hex_to_u64(payload.block_number.as_deref())?, "log.block_number")?,
            address: parse_address(payload.address.as_deref())?,
            data: payload.data.clone(),
            topics,
            removed: payload.removed,
            enrichment: self
                .enrich
                .then(|| LogEnrichment::new(block_timestamp, transaction_receipt_status)),
        })
    }
}
