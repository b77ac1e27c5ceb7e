//! Block payload mapping.

use super::{require, ReceiptMapper, TransactionMapper};
use crate::{records::Block, wire::BlockPayload};
use klay_primitives::{hex_to_u256, hex_to_u64, parse_address, parse_hash, BlockTime, ValidationError};
use tracing::warn;

/// Maps consensus-info block payloads into [Block] records.
#[derive(Debug, Default)]
pub struct BlockMapper {
    enrich: bool,
    transaction_mapper: Option<TransactionMapper>,
    receipt_mapper: Option<ReceiptMapper>,
}

impl BlockMapper {
    /// Creates a mapper producing raw or enriched child records.
    pub const fn new(enrich: bool) -> Self {
        Self { enrich, transaction_mapper: None, receipt_mapper: None }
    }

    /// Registers the child mapper for the block's transactions.
    ///
    /// A child whose enrich flag disagrees is forced to the parent's value.
    pub fn with_transaction_mapper(mut self, mut mapper: TransactionMapper) -> Self {
        if mapper.enrich() != self.enrich {
            warn!(target: "mapper", "child mapper enrichness differs from parent; forcing parent value");
            mapper.set_enrich(self.enrich);
        }
        self.transaction_mapper = Some(mapper);
        self
    }

    /// Registers the child mapper for the block's receipts.
    pub fn with_receipt_mapper(mut self, mut mapper: ReceiptMapper) -> Self {
        if mapper.enrich() != self.enrich {
            warn!(target: "mapper", "child mapper enrichness differs from parent; forcing parent value");
            mapper.set_enrich(self.enrich);
        }
        self.receipt_mapper = Some(mapper);
        self
    }

    /// Maps a block payload, including owned transactions and receipts when
    /// the respective child mappers are registered.
    pub fn map(&self, payload: &BlockPayload) -> Result<Block, ValidationError> {
        let timestamp_secs = require(hex_to_u64(payload.timestamp.as_deref())?, "block.timestamp")?;
        let timestamp_fos = hex_to_u64(payload.timestamp_fos.as_deref())?.unwrap_or(0);
        let block_timestamp = BlockTime::from_secs_fos(timestamp_secs, timestamp_fos)?;

        let transactions = match &self.transaction_mapper {
            Some(mapper) => payload
                .transactions
                .iter()
                .map(|tx| mapper.map(tx, block_timestamp))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let receipts = match &self.receipt_mapper {
            Some(mapper) if payload.is_full_block() => payload
                .transactions
                .iter()
                .filter(|tx| tx.has_receipt())
                .map(|tx| mapper.map(tx, block_timestamp))
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        let committee = payload
            .committee
            .as_ref()
            .map(|committee| {
                committee
                    .iter()
                    .map(|member| parse_address(Some(member)))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(Block {
            number: require(hex_to_u64(payload.number.as_deref())?, "block.number")?,
            hash: parse_hash(payload.hash.as_deref())?,
            parent_hash: parse_hash(payload.parent_hash.as_deref())?,
            logs_bloom: payload.logs_bloom.clone(),
            transactions_root: parse_hash(payload.transactions_root.as_deref())?,
            state_root: parse_hash(payload.state_root.as_deref())?,
            receipts_root: parse_hash(payload.receipts_root.as_deref())?,
            size: require(hex_to_u64(payload.size.as_deref())?, "block.size")?,
            extra_data: payload.extra_data.clone(),
            gas_used: hex_to_u64(payload.gas_used.as_deref())?.unwrap_or(0),
            block_timestamp,
            block_unix_timestamp: block_timestamp.unix(),
            transaction_count: payload.transactions.len() as u64,
            block_score: hex_to_u64(payload.block_score.as_deref())?,
            total_block_score: hex_to_u64(payload.total_block_score.as_deref())?,
            governance_data: payload.governance_data.clone(),
            vote_data: payload.vote_data.clone(),
            committee,
            proposer: parse_address(payload.proposer.as_deref())?,
            reward_address: parse_address(payload.reward.as_deref())?,
            base_fee_per_gas: hex_to_u256(payload.base_fee_per_gas.as_deref())?,
            transactions,
            receipts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::ReceiptLogMapper;
    use crate::wire::BlockPayload;
    use serde_json::json;

    fn consensus_block_payload() -> BlockPayload {
        serde_json::from_value(json!({
            "number": "0x5b8a8a7",
            "hash": "0xfcb46ee2e0656c5a6da13fdd05a306f5d0cd583a2516cba95a1b492e4086c068",
            "parentHash": "0x8955fe422a68babf0a83941ae18e97720ad4c2960c15e12745924af56042434c",
            "logsBloom": "0x0",
            "transactionsRoot": "0xf83fbed71a38ee3ce24d88ef3a60495cb88e3622ee2770a3dd74622d2ef473c6",
            "stateRoot": "0xf83fbed71a38ee3ce24d88ef3a60495cb88e3622ee2770a3dd74622d2ef473c6",
            "receiptsRoot": "0xf83fbed71a38ee3ce24d88ef3a60495cb88e3622ee2770a3dd74622d2ef473c6",
            "size": "0x2f2",
            "extraData": "0xd883010701846b6c617988676f312e31352e37856c696e757800",
            "gasUsed": "0x5208",
            "timestamp": "0x5ddd2365",
            "timestampFoS": "0x13",
            "blockscore": "0x1",
            "totalBlockScore": "0x5b8a8a8",
            "governanceData": "0x",
            "voteData": "0x",
            "committee": [
                "0x2bdf4c055102371aadb9b6bbe883b0b0a3a78ce0",
                "0x2abe3e13f3e82beb9708705164e4cc726d9802c3"
            ],
            "proposer": "0x2bdf4c055102371aadb9b6bbe883b0b0a3a78ce0",
            "reward": "0x2abe3e13f3e82beb9708705164e4cc726d9802c3",
            "transactions": [{
                "transactionHash": "0xf83fbed71a38ee3ce24d88ef3a60495cb88e3622ee2770a3dd74622d2ef473c6",
                "nonce": "0x1",
                "blockHash": "0xfcb46ee2e0656c5a6da13fdd05a306f5d0cd583a2516cba95a1b492e4086c068",
                "blockNumber": "0x5b8a8a7",
                "transactionIndex": "0x0",
                "from": "0x2bdf4c055102371aadb9b6bbe883b0b0a3a78ce0",
                "to": "0xcee8faf64bb97a73bb51e115aa89c17ffa8dd167",
                "value": "0x0",
                "gas": "0x7a120",
                "gasPrice": "0x5d21dba00",
                "gasUsed": "0x5208",
                "input": "0x",
                "type": "TxTypeLegacyTransaction",
                "typeInt": 0,
                "status": "0x1",
                "logs": [{
                    "logIndex": "0x0",
                    "transactionHash": "0xf83fbed71a38ee3ce24d88ef3a60495cb88e3622ee2770a3dd74622d2ef473c6",
                    "transactionIndex": "0x0",
                    "blockHash": "0xfcb46ee2e0656c5a6da13fdd05a306f5d0cd583a2516cba95a1b492e4086c068",
                    "blockNumber": "0x5b8a8a7",
                    "address": "0xcee8faf64bb97a73bb51e115aa89c17ffa8dd167",
                    "data": "0x000000000000000000000000000000000000000000000000000000000501cdf5",
                    "topics": [
                        "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
                        "0x0000000000000000000000002bdf4c055102371aadb9b6bbe883b0b0a3a78ce0",
                        "0x0000000000000000000000002abe3e13f3e82beb9708705164e4cc726d9802c3"
                    ],
                    "removed": false
                }]
            }]
        }))
        .unwrap()
    }

    fn full_mapper(enrich: bool) -> BlockMapper {
        BlockMapper::new(enrich)
            .with_transaction_mapper(
                TransactionMapper::new(enrich).with_log_mapper(ReceiptLogMapper::new(enrich)),
            )
            .with_receipt_mapper(
                ReceiptMapper::new(enrich).with_log_mapper(ReceiptLogMapper::new(enrich)),
            )
    }

    #[test]
    fn transaction_count_matches_owned_transactions() {
        let block = full_mapper(false).map(&consensus_block_payload()).unwrap();
        assert_eq!(block.transaction_count, block.transactions.len() as u64);
        assert_eq!(block.receipts.len(), 1);
        assert_eq!(block.receipts[0].logs.len(), 1);
    }

    #[test]
    fn combines_timestamp_with_fos() {
        let block = full_mapper(false).map(&consensus_block_payload()).unwrap();
        assert!((block.block_unix_timestamp - 1_574_773_605.019).abs() < 1e-6);
    }

    #[test]
    fn enrichment_attaches_receipt_context() {
        let block = full_mapper(true).map(&consensus_block_payload()).unwrap();
        let tx = &block.transactions[0];
        let enrichment = tx.enrichment.as_ref().unwrap();
        assert_eq!(enrichment.receipt_status, Some(1));
        assert_eq!(enrichment.receipt_gas_used, Some(0x5208));
        let log = &block.receipts[0].logs[0];
        assert_eq!(log.enrichment.as_ref().unwrap().transaction_receipt_status, Some(1));
    }

    #[test]
    fn enrichment_is_a_superset_of_raw() {
        let payload = consensus_block_payload();
        let raw = full_mapper(false).map(&payload).unwrap();
        let enriched = full_mapper(true).map(&payload).unwrap();

        let raw_json = serde_json::to_value(&raw.transactions[0]).unwrap();
        let enriched_json = serde_json::to_value(&enriched.transactions[0]).unwrap();
        for (field, value) in raw_json.as_object().unwrap() {
            assert_eq!(enriched_json.get(field), Some(value), "field {field} diverged");
        }

        // mapping twice with the same flag yields identical records
        let again = serde_json::to_value(full_mapper(true).map(&payload).unwrap().transactions[0].clone()).unwrap();
        assert_eq!(enriched_json, again);
    }

    #[test]
    fn effective_gas_price_falls_back_to_gas_price() {
        let block = full_mapper(false).map(&consensus_block_payload()).unwrap();
        let receipt = &block.receipts[0];
        assert_eq!(receipt.effective_gas_price, receipt.gas_price);
    }
}
