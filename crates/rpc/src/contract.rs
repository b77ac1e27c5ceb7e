//! ERC contract classification.
//!
//! Classification works from the deployed bytecode alone where possible: a
//! linear scan collects the 4-byte selectors the dispatcher compares
//! against, and the mandatory selector set of each standard decides
//! membership. Contracts that expose ERC-165 `supportsInterface` are probed
//! on-chain at their creation block instead, which also covers proxies whose
//! dispatcher hides the selectors.

use crate::{errors::RpcError, client::BatchProvider, RpcErrorKind};
use alloy_primitives::{fixed_bytes, hex, keccak256, Address, FixedBytes};
use alloy_sol_types::{sol, SolCall};
use tracing::debug;

sol! {
    function supportsInterface(bytes4 interfaceId) external view returns (bool);
}

/// ERC-165 interface id of ERC-20.
pub const ERC20_INTERFACE_ID: FixedBytes<4> = fixed_bytes!("36372b07");

/// ERC-165 interface id of ERC-721.
pub const ERC721_INTERFACE_ID: FixedBytes<4> = fixed_bytes!("80ac58cd");

/// ERC-165 interface id of ERC-1155.
pub const ERC1155_INTERFACE_ID: FixedBytes<4> = fixed_bytes!("d9b67a26");

/// The 4-byte selector of a canonical signature string, as 0x-prefixed hex.
pub fn selector(signature: &str) -> String {
    format!("0x{}", hex::encode(&keccak256(signature.as_bytes())[..4]))
}

/// Collects the sorted unique set of `PUSH4` immediates from runtime
/// bytecode, as 10-character hex selectors.
///
/// The scan is push-data aware: immediates of other push instructions are
/// skipped, not scanned into. A `PUSH3 0xfdd58e` is treated as a `PUSH4`
/// with a zero high byte; the selector of `balanceOf(address,uint256)`
/// starts with a zero byte, which optimizing compilers shorten to a PUSH3.
pub fn function_sighashes(bytecode: Option<&str>) -> Vec<String> {
    let Some(bytecode) = clean_bytecode(bytecode) else {
        return Vec::new();
    };
    let Ok(code) = hex::decode(bytecode) else {
        return Vec::new();
    };

    const PUSH1: u8 = 0x60;
    const PUSH3: u8 = 0x62;
    const PUSH4: u8 = 0x63;
    const PUSH32: u8 = 0x7f;

    let mut sighashes = Vec::new();
    let mut position = 0usize;
    while position < code.len() {
        let opcode = code[position];
        position += 1;
        if !(PUSH1..=PUSH32).contains(&opcode) {
            continue;
        }
        let width = usize::from(opcode - PUSH1) + 1;
        let immediate = code.get(position..position + width);
        position += width;
        let Some(immediate) = immediate else {
            break;
        };
        match opcode {
            PUSH4 => sighashes.push(format!("0x{}", hex::encode(immediate))),
            PUSH3 if immediate == [0xfd, 0xd5, 0x8e] => {
                sighashes.push(format!("0x00{}", hex::encode(immediate)));
            }
            _ => {}
        }
    }

    sighashes.sort_unstable();
    sighashes.dedup();
    sighashes
}

fn clean_bytecode(bytecode: Option<&str>) -> Option<&str> {
    match bytecode {
        None | Some("") | Some("0x") => None,
        Some(bytecode) => Some(bytecode.strip_prefix("0x").unwrap_or(bytecode)),
    }
}

/// Classifies contracts against the ERC-20/721/1155 standards.
#[derive(Debug)]
pub struct ContractClassifier<'a, P: BatchProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: BatchProvider + ?Sized> ContractClassifier<'a, P> {
    /// Creates a classifier probing through the given provider.
    pub const fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Whether the contract satisfies ERC-20.
    ///
    /// <https://github.com/ethereum/EIPs/blob/master/EIPS/eip-20.md>
    pub async fn is_erc20(
        &self,
        address: Address,
        sighashes: &[String],
        block_number: Option<u64>,
    ) -> Result<bool, RpcErrorKind> {
        if self.probe_interface(address, sighashes, ERC20_INTERFACE_ID, block_number).await? {
            return Ok(true);
        }
        Ok(implements_all(
            sighashes,
            &[
                "totalSupply()",
                "balanceOf(address)",
                "transfer(address,uint256)",
                "transferFrom(address,address,uint256)",
                "approve(address,uint256)",
                "allowance(address,address)",
            ],
        ))
    }

    /// Whether the contract satisfies ERC-721.
    ///
    /// The selector fallback accepts either transfer flavor so that
    /// CryptoKitties-style pre-final contracts still match.
    ///
    /// <https://github.com/ethereum/EIPs/blob/master/EIPS/eip-721.md>
    pub async fn is_erc721(
        &self,
        address: Address,
        sighashes: &[String],
        block_number: Option<u64>,
    ) -> Result<bool, RpcErrorKind> {
        if self.probe_interface(address, sighashes, ERC721_INTERFACE_ID, block_number).await? {
            return Ok(true);
        }
        Ok(implements_all(
            sighashes,
            &["balanceOf(address)", "ownerOf(uint256)", "approve(address,uint256)"],
        ) && implements_any(
            sighashes,
            &["transfer(address,uint256)", "transferFrom(address,address,uint256)"],
        ))
    }

    /// Whether the contract satisfies ERC-1155.
    ///
    /// <https://github.com/ethereum/EIPs/blob/master/EIPS/eip-1155.md>
    pub async fn is_erc1155(
        &self,
        address: Address,
        sighashes: &[String],
        block_number: Option<u64>,
    ) -> Result<bool, RpcErrorKind> {
        if self.probe_interface(address, sighashes, ERC1155_INTERFACE_ID, block_number).await? {
            return Ok(true);
        }
        Ok(implements_all(
            sighashes,
            &[
                "balanceOf(address,uint256)",
                "balanceOfBatch(address[],uint256[])",
                "setApprovalForAll(address,bool)",
                "isApprovedForAll(address,address)",
                "safeTransferFrom(address,address,uint256,uint256,bytes)",
                "safeBatchTransferFrom(address,address,uint256[],uint256[],bytes)",
            ],
        ))
    }

    /// Calls `supportsInterface` at the creation block when the bytecode
    /// carries its selector. A revert or malformed return is `false`.
    async fn probe_interface(
        &self,
        address: Address,
        sighashes: &[String],
        interface_id: FixedBytes<4>,
        block_number: Option<u64>,
    ) -> Result<bool, RpcErrorKind> {
        if !implements_all(sighashes, &["supportsInterface(bytes4)"]) {
            return Ok(false);
        }
        let data = supportsInterfaceCall { interfaceId: interface_id }.abi_encode();
        let returned = match self.provider.contract_call(address, data, block_number).await {
            Ok(returned) => returned,
            // reverts surface as server errors; treat as "not supported"
            Err(kind) if matches!(kind.inner(), RpcError::Server { .. }) => {
                debug!(target: "contract", %address, err = %kind, "supportsInterface probe reverted");
                return Ok(false);
            }
            Err(kind) => return Err(kind),
        };
        Ok(supportsInterfaceCall::abi_decode_returns(&returned, true)
            .map(|decoded| decoded._0)
            .unwrap_or(false))
    }
}

fn implements_all(sighashes: &[String], signatures: &[&str]) -> bool {
    signatures.iter().all(|signature| {
        let selector = selector(signature);
        sighashes.iter().any(|sighash| *sighash == selector)
    })
}

fn implements_any(sighashes: &[String], signatures: &[&str]) -> bool {
    signatures.iter().any(|signature| {
        let selector = selector(signature);
        sighashes.iter().any(|sighash| *sighash == selector)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBatchProvider;

    #[test]
    fn selectors_of_canonical_signatures() {
        assert_eq!(selector("transfer(address,uint256)"), "0xa9059cbb");
        assert_eq!(selector("totalSupply()"), "0x18160ddd");
        assert_eq!(selector("balanceOf(address,uint256)"), "0x00fdd58e");
    }

    #[test]
    fn empty_bytecode_yields_no_selectors() {
        assert!(function_sighashes(None).is_empty());
        assert!(function_sighashes(Some("0x")).is_empty());
        assert!(function_sighashes(Some("")).is_empty());
    }

    #[test]
    fn scans_push4_immediates() {
        // PUSH4 a9059cbb, PUSH1 00, PUSH4 18160ddd, duplicate PUSH4 a9059cbb
        let code = "0x63a9059cbb60006318160ddd63a9059cbb";
        assert_eq!(
            function_sighashes(Some(code)),
            vec!["0x18160ddd".to_string(), "0xa9059cbb".to_string()]
        );
    }

    #[test]
    fn push3_balance_of_special_case() {
        // PUSH3 fdd58e
        let code = "0x62fdd58e";
        assert_eq!(function_sighashes(Some(code)), vec!["0x00fdd58e".to_string()]);
    }

    #[test]
    fn push_data_is_not_scanned_into() {
        // PUSH32 whose immediate embeds what would look like a PUSH4
        let code = "0x7f63a9059cbb000000000000000000000000000000000000000000000000000000";
        assert!(function_sighashes(Some(code)).is_empty());
    }

    #[tokio::test]
    async fn selector_fallback_classifies_erc20() {
        let provider = MockBatchProvider::new(|_| panic!("no rpc expected"));
        let classifier = ContractClassifier::new(&provider);
        let sighashes: Vec<String> = [
            "totalSupply()",
            "balanceOf(address)",
            "transfer(address,uint256)",
            "transferFrom(address,address,uint256)",
            "approve(address,uint256)",
            "allowance(address,address)",
        ]
        .iter()
        .map(|signature| selector(signature))
        .collect();

        let is_erc20 =
            classifier.is_erc20(Address::ZERO, &sighashes, Some(1)).await.unwrap();
        assert!(is_erc20);
        let is_erc721 =
            classifier.is_erc721(Address::ZERO, &sighashes, Some(1)).await.unwrap();
        assert!(!is_erc721);
    }

    #[tokio::test]
    async fn erc165_probe_decides_when_present() {
        let provider = MockBatchProvider::contract_calls(|data: &[u8]| {
            // supportsInterface(0x80ac58cd) -> true, everything else false
            let wanted = data.get(4..8) == Some(ERC721_INTERFACE_ID.as_slice());
            let mut word = [0u8; 32];
            word[31] = u8::from(wanted);
            Ok(word.to_vec())
        });
        let classifier = ContractClassifier::new(&provider);
        let sighashes = vec![selector("supportsInterface(bytes4)")];

        assert!(classifier.is_erc721(Address::ZERO, &sighashes, Some(1)).await.unwrap());
        assert!(!classifier.is_erc20(Address::ZERO, &sighashes, Some(1)).await.unwrap());
        assert!(!classifier.is_erc1155(Address::ZERO, &sighashes, Some(1)).await.unwrap());
    }
}
