//! Best-effort token metadata reads.

use crate::{client::BatchProvider, errors::RpcError, RpcErrorKind};
use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use tracing::debug;

sol! {
    function symbol() external view returns (string);
    function name() external view returns (string);
    function decimals() external view returns (uint8);
    function totalSupply() external view returns (uint256);
}

/// The standard read-method results for a token contract.
///
/// Every field is independent: a contract that reverts on `symbol()` still
/// yields the other fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenMetadata {
    /// `symbol()`, NUL-stripped.
    pub symbol: Option<String>,
    /// `name()`, NUL-stripped.
    pub name: Option<String>,
    /// `decimals()`.
    pub decimals: Option<u8>,
    /// `totalSupply()`.
    pub total_supply: Option<U256>,
}

/// Reads token metadata through a [BatchProvider].
#[derive(Debug)]
pub struct TokenMetadataService<'a, P: BatchProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: BatchProvider + ?Sized> TokenMetadataService<'a, P> {
    /// Creates a service reading through the given provider.
    pub const fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Fetches the four standard read methods against the latest state.
    ///
    /// Reverts and undecodable returns yield `None` for the affected field;
    /// transport-level failures propagate so the executor can retry.
    pub async fn token_metadata(&self, address: Address) -> Result<TokenMetadata, RpcErrorKind> {
        let symbol = self
            .read(address, symbolCall {}.abi_encode(), |returned| {
                symbolCall::abi_decode_returns(returned, true).ok().map(|decoded| decoded._0)
            })
            .await?;
        let name = self
            .read(address, nameCall {}.abi_encode(), |returned| {
                nameCall::abi_decode_returns(returned, true).ok().map(|decoded| decoded._0)
            })
            .await?;
        let decimals = self
            .read(address, decimalsCall {}.abi_encode(), |returned| {
                decimalsCall::abi_decode_returns(returned, true).ok().map(|decoded| decoded._0)
            })
            .await?;
        let total_supply = self
            .read(address, totalSupplyCall {}.abi_encode(), |returned| {
                totalSupplyCall::abi_decode_returns(returned, true).ok().map(|decoded| decoded._0)
            })
            .await?;

        Ok(TokenMetadata {
            symbol: symbol.map(sanitize),
            name: name.map(sanitize),
            decimals,
            total_supply,
        })
    }

    async fn read<T>(
        &self,
        address: Address,
        data: Vec<u8>,
        decode: impl FnOnce(&[u8]) -> Option<T>,
    ) -> Result<Option<T>, RpcErrorKind> {
        match self.provider.contract_call(address, data, None).await {
            Ok(returned) => Ok(decode(&returned)),
            Err(kind) if matches!(kind.inner(), RpcError::Server { .. }) => {
                debug!(target: "token", %address, err = %kind, "metadata read reverted");
                Ok(None)
            }
            Err(kind) => Err(kind),
        }
    }
}

/// Strips ASCII NUL bytes, which the downstream warehouse rejects.
fn sanitize(content: String) -> String {
    if content.contains('\0') {
        content.replace('\0', "")
    } else {
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBatchProvider;
    use alloy_sol_types::SolValue;

    #[tokio::test]
    async fn reads_are_independent() {
        let provider = MockBatchProvider::contract_calls(|data: &[u8]| {
            if data.starts_with(&symbolCall::SELECTOR) {
                Ok("KLAY\0".abi_encode())
            } else if data.starts_with(&decimalsCall::SELECTOR) {
                Ok(decimalsCall::abi_encode_returns(&(18u8,)))
            } else {
                Err(RpcError::Server { code: 3, message: "execution reverted".into() }.fatal())
            }
        });
        let service = TokenMetadataService::new(&provider);
        let metadata = service.token_metadata(Address::ZERO).await.unwrap();

        assert_eq!(metadata.symbol.as_deref(), Some("KLAY"));
        assert_eq!(metadata.name, None);
        assert_eq!(metadata.decimals, Some(18));
        assert_eq!(metadata.total_supply, None);
    }

    #[tokio::test]
    async fn transport_failures_propagate() {
        let provider = MockBatchProvider::contract_calls(|_: &[u8]| {
            Err(RpcError::Timeout("deadline exceeded".into()).temp())
        });
        let service = TokenMetadataService::new(&provider);
        assert!(service.token_metadata(Address::ZERO).await.is_err());
    }
}
