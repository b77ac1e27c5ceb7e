//! Token-transfer extraction from receipt logs.

use crate::records::{ReceiptLog, TokenTransfer, TransferEnrichment};
use alloy_primitives::{b256, hex, Address, B256, U256};
use tracing::warn;

/// topic-0 of `Transfer(address,address,uint256)` (ERC-20 and ERC-721).
pub const TRANSFER_EVENT_TOPIC: B256 =
    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// topic-0 of `TransferSingle(address,address,address,uint256,uint256)`.
pub const ERC1155_TRANSFER_SINGLE_TOPIC: B256 =
    b256!("c3d58168c5ae7397731d063d5bbf3d657854427343f4c083240f7aacaa2d0f62");

/// topic-0 of `TransferBatch(address,address,address,uint256[],uint256[])`.
pub const ERC1155_TRANSFER_BATCH_TOPIC: B256 =
    b256!("4a39dc06d4c0dbc64b70af90fd698a233a518aa5d07e595d983b8c0526c8f7fb");

/// Extracts the ERC-20/721 transfer carried by a log, if any.
pub fn extract_transfer_from_log(log: &ReceiptLog) -> Option<TokenTransfer> {
    let topic0 = log.topics.first()?;
    if *topic0 != TRANSFER_EVENT_TOPIC {
        return None;
    }
    if log.topics.len() != 3 {
        warn!(
            target: "token_transfer",
            transaction_hash = %log.transaction_hash,
            log_index = log.log_index,
            topics = log.topics.len(),
            "transfer event with unexpected topic arity, skipping"
        );
        return None;
    }

    let words = decode_data_words(log)?;
    let Some(value) = words.first() else {
        warn!(
            target: "token_transfer",
            transaction_hash = %log.transaction_hash,
            log_index = log.log_index,
            "transfer event with empty data, skipping"
        );
        return None;
    };

    Some(build_transfer(
        log,
        word_to_address(&log.topics[1]),
        word_to_address(&log.topics[2]),
        *value,
    ))
}

/// Extracts every transfer carried by a log: the ERC-20/721 `Transfer`
/// event, the ERC-1155 `TransferSingle` event, or one record per (id, value)
/// pair of an ERC-1155 `TransferBatch` event.
pub fn extract_transfers_from_log(log: &ReceiptLog) -> Vec<TokenTransfer> {
    let Some(topic0) = log.topics.first() else {
        return Vec::new();
    };

    if *topic0 == TRANSFER_EVENT_TOPIC {
        return extract_transfer_from_log(log).into_iter().collect();
    }

    if *topic0 == ERC1155_TRANSFER_SINGLE_TOPIC || *topic0 == ERC1155_TRANSFER_BATCH_TOPIC {
        if log.topics.len() != 4 {
            warn!(
                target: "token_transfer",
                transaction_hash = %log.transaction_hash,
                log_index = log.log_index,
                topics = log.topics.len(),
                "erc1155 transfer event with unexpected topic arity, skipping"
            );
            return Vec::new();
        }
        let from = word_to_address(&log.topics[2]);
        let to = word_to_address(&log.topics[3]);
        let Some(words) = decode_data_words(log) else {
            return Vec::new();
        };

        if *topic0 == ERC1155_TRANSFER_SINGLE_TOPIC {
            // data is (id, value); the record carries the value
            return match words.get(1) {
                Some(value) => vec![build_transfer(log, from, to, *value)],
                None => Vec::new(),
            };
        }

        return decode_batch_values(&words)
            .into_iter()
            .map(|value| build_transfer(log, from, to, value))
            .collect();
    }

    Vec::new()
}

/// The `values` array of an ABI-encoded `(uint256[] ids, uint256[] values)`
/// payload. Malformed encodings yield an empty list.
fn decode_batch_values(words: &[U256]) -> Vec<U256> {
    let word_offset = |index: usize| -> Option<usize> {
        let offset: usize = words.get(index)?.try_into().ok()?;
        (offset % 32 == 0).then_some(offset / 32)
    };
    let Some(values_start) = word_offset(1) else {
        return Vec::new();
    };
    let Some(len) = words.get(values_start).and_then(|len| usize::try_from(*len).ok()) else {
        return Vec::new();
    };
    words
        .get(values_start + 1..)
        .map(|tail| tail.iter().take(len).copied().collect())
        .unwrap_or_default()
}

fn decode_data_words(log: &ReceiptLog) -> Option<Vec<U256>> {
    let data = log.data.as_deref()?;
    let bytes = hex::decode(data).ok()?;
    Some(
        bytes
            .chunks_exact(32)
            .map(U256::from_be_slice)
            .collect(),
    )
}

fn word_to_address(word: &B256) -> Address {
    Address::from_slice(&word[12..])
}

fn build_transfer(log: &ReceiptLog, from: Address, to: Address, value: U256) -> TokenTransfer {
    TokenTransfer {
        token_address: log.address,
        from_address: from,
        to_address: to,
        value,
        log_index: log.log_index,
        transaction_hash: log.transaction_hash,
        transaction_index: log.transaction_index,
        block_hash: log.block_hash,
        block_number: log.block_number,
        enrichment: log.enrichment.as_ref().map(|inherited| {
            TransferEnrichment::new(inherited.block_timestamp, inherited.transaction_receipt_status)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use std::str::FromStr;

    fn transfer_log() -> ReceiptLog {
        ReceiptLog {
            log_index: 70,
            transaction_hash: B256::from_str(
                "0xf83fbed71a38ee3ce24d88ef3a60495cb88e3622ee2770a3dd74622d2ef473c6",
            )
            .unwrap(),
            transaction_index: 67,
            block_hash: B256::from_str(
                "0xfcb46ee2e0656c5a6da13fdd05a306f5d0cd583a2516cba95a1b492e4086c068",
            )
            .unwrap(),
            block_number: 81165353,
            address: address!("cee8faf64bb97a73bb51e115aa89c17ffa8dd167"),
            data: Some(
                "0x000000000000000000000000000000000000000000000000000000000501cdf5".to_string(),
            ),
            topics: vec![
                TRANSFER_EVENT_TOPIC,
                B256::from_str(
                    "0x0000000000000000000000002bdf4c055102371aadb9b6bbe883b0b0a3a78ce0",
                )
                .unwrap(),
                B256::from_str(
                    "0x0000000000000000000000002abe3e13f3e82beb9708705164e4cc726d9802c3",
                )
                .unwrap(),
            ],
            removed: Some(false),
            enrichment: None,
        }
    }

    #[test]
    fn extracts_erc20_transfer() {
        let transfer = extract_transfer_from_log(&transfer_log()).unwrap();
        assert_eq!(
            transfer.token_address,
            address!("cee8faf64bb97a73bb51e115aa89c17ffa8dd167")
        );
        assert_eq!(
            transfer.from_address,
            address!("2bdf4c055102371aadb9b6bbe883b0b0a3a78ce0")
        );
        assert_eq!(
            transfer.to_address,
            address!("2abe3e13f3e82beb9708705164e4cc726d9802c3")
        );
        assert_eq!(transfer.value, U256::from(84_004_341u64));
        assert_eq!(transfer.block_number, 81165353);
    }

    #[test]
    fn skips_unrelated_topics() {
        let mut log = transfer_log();
        log.topics[0] = B256::ZERO;
        assert!(extract_transfer_from_log(&log).is_none());
    }

    #[test]
    fn skips_malformed_arity() {
        let mut log = transfer_log();
        log.topics.truncate(2);
        assert!(extract_transfer_from_log(&log).is_none());
    }

    #[test]
    fn decodes_erc1155_batch_values() {
        let mut log = transfer_log();
        log.topics = vec![
            ERC1155_TRANSFER_BATCH_TOPIC,
            B256::ZERO,
            transfer_log().topics[1],
            transfer_log().topics[2],
        ];
        // (ids=[1, 2], values=[10, 20])
        let mut data = String::from("0x");
        for word in [
            0x40u64, 0xa0, // array offsets
            2, 1, 2, // ids
            2, 10, 20, // values
        ] {
            data.push_str(&format!("{word:064x}"));
        }
        log.data = Some(data);

        let transfers = extract_transfers_from_log(&log);
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].value, U256::from(10u64));
        assert_eq!(transfers[1].value, U256::from(20u64));
    }
}
