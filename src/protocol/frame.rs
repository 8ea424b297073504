//! Inbound frames

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client-local event dispatched whenever a connection opens.
/// Never expected over the wire.
pub const CONNECTED_EVENT: &str = "connected";

/// Frame written by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Response to a correlated request
    Result { data: RpcResponse },
    /// Uncorrelated push event
    Event {
        event: String,
        #[serde(default)]
        data: Value,
    },
}

/// Response to an RPC request, matched by `transaction_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub success: bool,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Value,
    pub transaction_id: String,
}

impl RpcResponse {
    /// Create a successful response
    pub fn ok(transaction_id: impl Into<String>, result: Value) -> Self {
        Self {
            success: true,
            result,
            transaction_id: transaction_id.into(),
            ..Default::default()
        }
    }

    /// Create a failed response
    pub fn failure(transaction_id: impl Into<String>, error: Value) -> Self {
        Self {
            success: false,
            error,
            transaction_id: transaction_id.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter for the echoed service and method
    pub fn for_call(mut self, service: impl Into<String>, method: impl Into<String>) -> Self {
        self.service = service.into();
        self.method = method.into();
        self
    }

    /// Wrap into a `result` frame
    pub fn into_frame(self) -> InboundFrame {
        InboundFrame::Result { data: self }
    }
}

/// A push event as delivered to listeners
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    pub event: String,
    pub data: Value,
}

impl PushEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// The synthetic event fired on every successful open
    pub fn connected() -> Self {
        Self::new(CONNECTED_EVENT, Value::Null)
    }

    /// Decode the payload into a typed value
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }

    /// Wrap into an `event` frame
    pub fn into_frame(self) -> InboundFrame {
        InboundFrame::Event {
            event: self.event,
            data: self.data,
        }
    }
}
