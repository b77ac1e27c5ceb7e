//! Mappers from wire payloads to export records.
//!
//! A mapper owns the child mappers for its recursive fields, mirroring the
//! record ownership tree (block -> transactions -> logs, block -> receipts
//! -> logs). The enrich flag of a parent is forced onto its children at
//! registration time; mixed-enrichness trees are not representable.

mod block;
pub use block::BlockMapper;

mod transaction;
pub use transaction::TransactionMapper;

mod receipt;
pub use receipt::ReceiptMapper;

mod receipt_log;
pub use receipt_log::ReceiptLogMapper;

use klay_primitives::ValidationError;
use serde_json::Value;

/// Unwraps a required wire field.
pub(crate) fn require<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

/// Normalizes the fee-delegation ratio: 0 without a fee payer, 100 when a
/// payer is present and the wire field absent, else the wire value.
pub(crate) const fn normalize_fee_ratio(
    has_fee_payer: bool,
    wire_ratio: Option<u64>,
) -> Result<u8, ValidationError> {
    match (has_fee_payer, wire_ratio) {
        (false, _) => Ok(0),
        (true, None) => Ok(100),
        (true, Some(ratio)) if ratio <= 100 => Ok(ratio as u8),
        (true, Some(ratio)) => Err(ValidationError::FeeRatioOutOfRange(ratio)),
    }
}

/// Renames `storageKeys` to `storage_keys` on each access list entry.
pub(crate) fn normalize_access_list(access_list: Option<Value>) -> Option<Value> {
    let mut access_list = access_list?;
    if let Value::Array(entries) = &mut access_list {
        for entry in entries {
            if let Value::Object(entry) = entry {
                if let Some(keys) = entry.remove("storageKeys") {
                    entry.insert("storage_keys".to_string(), keys);
                }
            }
        }
    }
    Some(access_list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fee_ratio_defaults() {
        assert_eq!(normalize_fee_ratio(false, None).unwrap(), 0);
        assert_eq!(normalize_fee_ratio(false, Some(30)).unwrap(), 0);
        assert_eq!(normalize_fee_ratio(true, None).unwrap(), 100);
        assert_eq!(normalize_fee_ratio(true, Some(30)).unwrap(), 30);
        assert!(normalize_fee_ratio(true, Some(101)).is_err());
    }

    #[test]
    fn access_list_storage_keys_rename() {
        let normalized = normalize_access_list(Some(json!([
            {"address": "0x0000000000000000000000000000000000000001", "storageKeys": ["0x01"]}
        ])))
        .unwrap();
        assert_eq!(
            normalized[0]["storage_keys"],
            json!(["0x01"]),
        );
        assert!(normalized[0].get("storageKeys").is_none());
    }
}
