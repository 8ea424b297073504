//! Transport and RPC error types

use thiserror::Error;

use crate::protocol::RpcResponse;

/// Local failures of the connection layer
#[derive(Debug, Error)]
pub enum TransportError {
    /// No socket is open, or it is closing/closed
    #[error("socket is not connected")]
    Disconnected,

    /// Opening the connection failed
    #[error("failed to connect to {url}: {reason}")]
    Connect {
        /// Address we tried to reach.
        url: String,
        /// Why the attempt failed.
        reason: String,
    },

    /// An outbound frame could not be encoded
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures of a correlated request
#[derive(Debug, Error)]
pub enum RpcError {
    /// The request never left the client
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with `success: false`
    #[error("{}.{} rejected: {}", .0.service, .0.method, .0.error)]
    Rejected(Box<RpcResponse>),

    /// No response within the configured timeout
    #[error("no response for transaction {transaction_id} after {timeout_ms}ms")]
    Timeout {
        /// Correlation id of the abandoned request.
        transaction_id: String,
        /// How long we waited.
        timeout_ms: u64,
    },

    /// The transport was dropped while the request was pending
    #[error("transport dropped the pending request")]
    Dropped,
}

impl RpcError {
    /// Server-provided error payload of a rejected request
    pub fn server_error(&self) -> Option<&serde_json::Value> {
        match self {
            RpcError::Rejected(response) => Some(&response.error),
            _ => None,
        }
    }
}
