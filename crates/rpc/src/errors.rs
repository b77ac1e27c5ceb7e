//! RPC error types, split by severity.

use thiserror::Error;

/// An error encountered while issuing or decoding a JSON-RPC request.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RpcError {
    /// The HTTP transport failed before a response was decoded.
    #[error("transport error: {0}")]
    Transport(String),
    /// The request or an individual call timed out.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The response body was not a well-formed JSON-RPC envelope.
    #[error("malformed response: {0}")]
    Decode(String),
    /// A response item carried neither a usable result nor an error object.
    #[error("result is None in response {id}; make sure the node is synced")]
    MissingResult {
        /// The id of the offending response item.
        id: u64,
    },
    /// The server answered an item with an error object.
    #[error("server error {code}: {message}")]
    Server {
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },
    /// The batch response cardinality disagrees with the request.
    #[error("batch returned {got} responses for {want} calls")]
    CountMismatch {
        /// Number of calls sent.
        want: usize,
        /// Number of responses received.
        got: usize,
    },
}

/// A top-level filter for [RpcError] that sorts by severity.
///
/// Temporary errors cause the batch work executor to halve the failing batch
/// and retry; fatal errors surface to the driver.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RpcErrorKind {
    /// A transient error; the request may succeed on retry, possibly against
    /// a different node behind the load balancer.
    #[error("temporary error: {0}")]
    Temporary(#[source] RpcError),
    /// A permanent error.
    #[error("fatal error: {0}")]
    Fatal(#[source] RpcError),
}

impl RpcErrorKind {
    /// Whether the executor should retry the failing batch.
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// The wrapped error.
    pub const fn inner(&self) -> &RpcError {
        match self {
            Self::Temporary(inner) | Self::Fatal(inner) => inner,
        }
    }
}

impl RpcError {
    /// Wraps this error as [RpcErrorKind::Temporary].
    pub const fn temp(self) -> RpcErrorKind {
        RpcErrorKind::Temporary(self)
    }

    /// Wraps this error as [RpcErrorKind::Fatal].
    pub const fn fatal(self) -> RpcErrorKind {
        RpcErrorKind::Fatal(self)
    }
}

/// Whether a JSON-RPC error code marks a server-side transient condition.
///
/// Per the JSON-RPC spec, -32603 is an internal error and the -32000..-32099
/// band is reserved for implementation-defined server errors.
pub(crate) const fn is_retriable_code(code: i64) -> bool {
    code == -32603 || (code >= -32099 && code <= -32000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retriable_code_band() {
        assert!(is_retriable_code(-32603));
        assert!(is_retriable_code(-32000));
        assert!(is_retriable_code(-32050));
        assert!(is_retriable_code(-32099));
        assert!(!is_retriable_code(-32601));
        assert!(!is_retriable_code(-32100));
        assert!(!is_retriable_code(0));
    }
}
