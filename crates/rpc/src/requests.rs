//! Request builders for the Klaytn methods the pipeline depends on.
//!
//! Every builder sets the call id to the block number so batch responses
//! correlate back to their block without inspecting the payload.

use crate::client::RpcCall;
use alloy_primitives::{hex, Address};
use serde_json::json;

/// `klay_getBlockWithConsensusInfoByNumber`: block body with embedded
/// transactions, receipt fields, logs, and PoA consensus info. One round
/// trip replaces the (block-by-number, receipt-by-hash) pair.
pub fn block_with_consensus_info_by_number(
    numbers: impl IntoIterator<Item = u64>,
) -> Vec<RpcCall> {
    numbers
        .into_iter()
        .map(|number| {
            RpcCall::new(
                number,
                "klay_getBlockWithConsensusInfoByNumber",
                json!([format!("0x{number:x}")]),
            )
        })
        .collect()
}

/// `debug_traceBlockByNumber` with the call tracer: per-transaction call
/// trees for every transaction in the block.
pub fn trace_block_by_number(numbers: impl IntoIterator<Item = u64>) -> Vec<RpcCall> {
    numbers
        .into_iter()
        .map(|number| {
            RpcCall::new(
                number,
                "debug_traceBlockByNumber",
                json!([format!("0x{number:x}"), {"tracer": "fastCallTracer"}]),
            )
        })
        .collect()
}

/// `eth_call` against a contract, pinned to a block or the latest state.
pub fn eth_call(to: Address, data: &[u8], block: Option<u64>) -> RpcCall {
    let block_tag = match block {
        Some(number) => json!(format!("0x{number:x}")),
        None => json!("latest"),
    };
    RpcCall::new(
        block.unwrap_or_default(),
        "eth_call",
        json!([{"to": to, "data": format!("0x{}", hex::encode(data))}, block_tag]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn block_request_ids_are_block_numbers() {
        let calls = block_with_consensus_info_by_number(5..=7);
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].id, 5);
        assert_eq!(calls[2].id, 7);
        assert_eq!(calls[0].params, json!(["0x5"]));
    }

    #[test]
    fn eth_call_defaults_to_latest() {
        let call = eth_call(address!("cee8faf64bb97a73bb51e115aa89c17ffa8dd167"), &[0x18], None);
        assert_eq!(call.params[1], json!("latest"));
        assert_eq!(call.params[0]["data"], json!("0x18"));
    }
}
