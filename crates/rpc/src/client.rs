//! The batch JSON-RPC client.

use crate::errors::{is_retriable_code, RpcError, RpcErrorKind};
use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// The trace endpoint reports this parent for the first blocks after
/// genesis; the condition is a permanent edge of the chain, not an error.
const GENESIS_PARENT_NOT_FOUND: &str =
    "parent 0000000000000000000000000000000000000000000000000000000000000000 not found";

/// A single call within a JSON-RPC batch.
#[derive(Clone, Debug, Serialize)]
pub struct RpcCall {
    /// Correlation id; the jobs use the block number.
    pub id: u64,
    /// Method name.
    pub method: &'static str,
    /// Positional parameters.
    pub params: Value,
}

impl RpcCall {
    /// Builds a call with the given correlation id.
    pub const fn new(id: u64, method: &'static str, params: Value) -> Self {
        Self { id, method, params }
    }

    fn envelope(&self) -> Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": self.id,
            "method": self.method,
            "params": self.params,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponseItem {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// The provider seam of the pipeline.
///
/// Jobs and services depend on this trait rather than the concrete HTTP
/// client so tests can drive them from canned responses.
#[async_trait]
pub trait BatchProvider: Send + Sync {
    /// Sends the calls as one JSON-RPC batch and returns the classified
    /// results in request order.
    async fn make_batch_request(&self, calls: &[RpcCall]) -> Result<Vec<Value>, RpcErrorKind>;

    /// Performs an `eth_call` against a contract at the given block, or the
    /// latest state when `block` is `None`. Returns the raw return data.
    async fn contract_call(
        &self,
        to: Address,
        data: Vec<u8>,
        block: Option<u64>,
    ) -> Result<Vec<u8>, RpcErrorKind>;
}

/// An HTTP JSON-RPC batch client.
///
/// Cheap to clone; the jobs construct one per worker via [ProviderFactory]
/// so no worker ever waits on another's in-flight call.
#[derive(Clone, Debug)]
pub struct BatchRpcClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl BatchRpcClient {
    /// Creates a client against the given endpoint with a per-request
    /// timeout.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, RpcErrorKind> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RpcError::Transport(err.to_string()).fatal())?;
        Ok(Self { http, endpoint })
    }

    async fn post(&self, body: Value) -> Result<Value, RpcErrorKind> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;
        response
            .json::<Value>()
            .await
            .map_err(|err| RpcError::Decode(err.to_string()).fatal())
    }

    fn decode_batch(
        calls: &[RpcCall],
        body: Value,
    ) -> Result<Vec<Value>, RpcErrorKind> {
        let items: Vec<RpcResponseItem> = serde_json::from_value(body)
            .map_err(|err| RpcError::Decode(err.to_string()).fatal())?;
        if items.len() != calls.len() {
            return Err(RpcError::CountMismatch { want: calls.len(), got: items.len() }.fatal());
        }

        // servers may permute batch responses; restore request order by id
        let mut by_id: Vec<Option<RpcResponseItem>> = items.into_iter().map(Some).collect();
        calls
            .iter()
            .map(|call| {
                let position = by_id
                    .iter()
                    .position(|item| {
                        item.as_ref().is_some_and(|item| item.id == Some(call.id))
                    })
                    .ok_or_else(|| {
                        RpcError::Decode(format!("no response for id {}", call.id)).fatal()
                    })?;
                let item = by_id[position].take().expect("position found above");
                classify_response(call.id, item)
            })
            .collect()
    }
}

fn classify_transport_error(err: reqwest::Error) -> RpcErrorKind {
    if err.is_timeout() {
        RpcError::Timeout(err.to_string()).temp()
    } else {
        RpcError::Transport(err.to_string()).temp()
    }
}

/// Classifies one JSON-RPC response item per the severity rules.
fn classify_response(id: u64, item: RpcResponseItem) -> Result<Value, RpcErrorKind> {
    if let Some(result) = item.result {
        if !result.is_null() {
            return Ok(result);
        }
    }

    match item.error {
        Some(error) => {
            let code = error.code.unwrap_or_default();
            let message = error.message.unwrap_or_default();
            if message == GENESIS_PARENT_NOT_FOUND {
                return Ok(Value::Array(Vec::new()));
            }
            if is_retriable_code(code) {
                Err(RpcError::Server { code, message }.temp())
            } else {
                Err(RpcError::Server { code, message }.fatal())
            }
        }
        // a null result with no error object usually means the node is
        // still syncing; retrying may reach a synced node
        None => Err(RpcError::MissingResult { id }.temp()),
    }
}

#[async_trait]
impl BatchProvider for BatchRpcClient {
    async fn make_batch_request(&self, calls: &[RpcCall]) -> Result<Vec<Value>, RpcErrorKind> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        let body = Value::Array(calls.iter().map(RpcCall::envelope).collect());
        let response = self.post(body).await?;
        Self::decode_batch(calls, response)
    }

    async fn contract_call(
        &self,
        to: Address,
        data: Vec<u8>,
        block: Option<u64>,
    ) -> Result<Vec<u8>, RpcErrorKind> {
        let call = crate::requests::eth_call(to, &data, block);
        let response = self.post(call.envelope()).await?;
        let item: RpcResponseItem = serde_json::from_value(response)
            .map_err(|err| RpcError::Decode(err.to_string()).fatal())?;
        let result = classify_response(call.id, item)?;
        let hex = result
            .as_str()
            .ok_or_else(|| RpcError::Decode("eth_call result is not a string".to_string()).fatal())?;
        alloy_primitives::hex::decode(hex)
            .map_err(|err| RpcError::Decode(err.to_string()).fatal())
    }
}

/// A source of worker-scoped providers.
///
/// Workers build their provider through this seam once and keep it for the
/// run, so no connection is shared between workers. Tests substitute a
/// source that hands out a mock.
pub trait ProviderSource: Send + Sync {
    /// Constructs a provider for one worker.
    fn provider(&self) -> Result<std::sync::Arc<dyn BatchProvider>, RpcErrorKind>;
}

/// Builds one [BatchRpcClient] per worker.
#[derive(Clone, Debug)]
pub struct ProviderFactory {
    endpoint: Url,
    timeout: Duration,
}

impl ProviderFactory {
    /// Creates a factory for the given endpoint and per-request timeout.
    pub const fn new(endpoint: Url, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    /// Constructs a fresh client.
    pub fn client(&self) -> Result<BatchRpcClient, RpcErrorKind> {
        BatchRpcClient::new(self.endpoint.clone(), self.timeout)
    }
}

impl ProviderSource for ProviderFactory {
    fn provider(&self) -> Result<std::sync::Arc<dyn BatchProvider>, RpcErrorKind> {
        Ok(std::sync::Arc::new(self.client()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> RpcResponseItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn present_result_succeeds() {
        let result = classify_response(1, item(json!({"id": 1, "result": {"number": "0x1"}})));
        assert_eq!(result.unwrap(), json!({"number": "0x1"}));
    }

    #[test]
    fn genesis_parent_yields_empty_result() {
        let result = classify_response(
            1,
            item(json!({
                "id": 1,
                "error": {"code": -32000, "message": GENESIS_PARENT_NOT_FOUND}
            })),
        );
        assert_eq!(result.unwrap(), json!([]));
    }

    #[test]
    fn missing_error_is_temporary() {
        let result = classify_response(7, item(json!({"id": 7, "result": null})));
        assert!(result.unwrap_err().is_temporary());
    }

    #[test]
    fn server_error_band_is_temporary() {
        for code in [-32603i64, -32000, -32099] {
            let result = classify_response(
                1,
                item(json!({"id": 1, "error": {"code": code, "message": "busy"}})),
            );
            assert!(result.unwrap_err().is_temporary(), "code {code}");
        }
    }

    #[test]
    fn other_errors_are_fatal() {
        let result = classify_response(
            1,
            item(json!({"id": 1, "error": {"code": -32601, "message": "method not found"}})),
        );
        assert!(!result.unwrap_err().is_temporary());
    }

    #[test]
    fn batch_order_is_restored_by_id() {
        let calls = vec![
            RpcCall::new(1, "klay_getBlockWithConsensusInfoByNumber", json!(["0x1"])),
            RpcCall::new(2, "klay_getBlockWithConsensusInfoByNumber", json!(["0x2"])),
        ];
        let body = json!([
            {"id": 2, "result": "second"},
            {"id": 1, "result": "first"},
        ]);
        let results = BatchRpcClient::decode_batch(&calls, body).unwrap();
        assert_eq!(results, vec![json!("first"), json!("second")]);
    }

    #[test]
    fn count_mismatch_is_fatal() {
        let calls = vec![RpcCall::new(1, "klay_getBlockWithConsensusInfoByNumber", json!(["0x1"]))];
        let result = BatchRpcClient::decode_batch(&calls, json!([]));
        assert!(matches!(
            result.unwrap_err(),
            RpcErrorKind::Fatal(RpcError::CountMismatch { .. })
        ));
    }
}
