//! Test utilities for the RPC layer.

use crate::{
    client::{BatchProvider, RpcCall},
    errors::{RpcError, RpcErrorKind},
};
use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::Value;

type BatchHandler = dyn Fn(&RpcCall) -> Result<Value, RpcErrorKind> + Send + Sync;
type CallHandler = dyn Fn(&[u8]) -> Result<Vec<u8>, RpcErrorKind> + Send + Sync;

/// A [BatchProvider] serving canned responses from closures.
pub struct MockBatchProvider {
    batch_handler: Box<BatchHandler>,
    call_handler: Option<Box<CallHandler>>,
}

impl std::fmt::Debug for MockBatchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBatchProvider").finish_non_exhaustive()
    }
}

impl MockBatchProvider {
    /// Creates a provider answering batch calls through the given closure,
    /// one call at a time.
    pub fn new(
        handler: impl Fn(&RpcCall) -> Result<Value, RpcErrorKind> + Send + Sync + 'static,
    ) -> Self {
        Self { batch_handler: Box::new(handler), call_handler: None }
    }

    /// Creates a provider that only answers `eth_call`s; batch requests
    /// fail fatally.
    pub fn contract_calls(
        handler: impl Fn(&[u8]) -> Result<Vec<u8>, RpcErrorKind> + Send + Sync + 'static,
    ) -> Self {
        Self {
            batch_handler: Box::new(|call| {
                Err(RpcError::Server {
                    code: -32601,
                    message: format!("unexpected batch call {}", call.method),
                }
                .fatal())
            }),
            call_handler: Some(Box::new(handler)),
        }
    }

    /// Adds an `eth_call` handler to a batch-handling provider.
    pub fn with_contract_calls(
        mut self,
        handler: impl Fn(&[u8]) -> Result<Vec<u8>, RpcErrorKind> + Send + Sync + 'static,
    ) -> Self {
        self.call_handler = Some(Box::new(handler));
        self
    }
}

#[async_trait]
impl BatchProvider for MockBatchProvider {
    async fn make_batch_request(&self, calls: &[RpcCall]) -> Result<Vec<Value>, RpcErrorKind> {
        calls.iter().map(|call| (self.batch_handler)(call)).collect()
    }

    async fn contract_call(
        &self,
        _to: Address,
        data: Vec<u8>,
        _block: Option<u64>,
    ) -> Result<Vec<u8>, RpcErrorKind> {
        match &self.call_handler {
            Some(handler) => handler(&data),
            None => {
                Err(RpcError::Server { code: 3, message: "execution reverted".into() }.fatal())
            }
        }
    }
}
