//! Outbound envelopes

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top level method of an outbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameMethod {
    /// Correlated RPC request
    Request,
    /// Start receiving pushes for a channel
    Subscribe,
    /// Stop receiving pushes for a channel
    Unsubscribe,
}

/// Envelope of every frame the client writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub correlation_id: String,
    pub method: FrameMethod,
    pub data: Value,
}

impl OutboundFrame {
    /// Wrap an RPC request
    pub fn request(gateway: &str, request: &RpcRequest) -> Result<Self, serde_json::Error> {
        Ok(Self {
            correlation_id: gateway.to_string(),
            method: FrameMethod::Request,
            data: serde_json::to_value(request)?,
        })
    }

    /// Build a subscribe/unsubscribe control frame
    pub fn control(gateway: &str, method: FrameMethod, channel: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            correlation_id: gateway.to_string(),
            method,
            data: serde_json::to_value(ChannelControl {
                channel: channel.to_string(),
            })?,
        })
    }

    /// Decode the inner request of a `request` frame
    pub fn rpc_request(&self) -> Option<RpcRequest> {
        if self.method != FrameMethod::Request {
            return None;
        }
        serde_json::from_value(self.data.clone()).ok()
    }

    /// Channel named by a subscribe/unsubscribe frame
    pub fn channel(&self) -> Option<&str> {
        match self.method {
            FrameMethod::Request => None,
            _ => self.data.get("channel").and_then(Value::as_str),
        }
    }

    /// Transaction id carried by a `request` frame
    pub fn transaction_id(&self) -> Option<&str> {
        self.data.get("transaction_id").and_then(Value::as_str)
    }
}

/// Payload of a `request` frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub service: String,
    pub method: String,
    pub data: Value,
    pub transaction_id: String,
}

/// Payload of a `subscribe`/`unsubscribe` frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelControl {
    pub channel: String,
}

/// A service call as issued by callers, before a transaction id is attached
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    pub service: String,
    pub method: String,
    pub data: Value,
}

impl RpcCall {
    pub fn new(service: impl Into<String>, method: impl Into<String>, data: Value) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
            data,
        }
    }

    /// Attach a transaction id
    pub fn into_request(self, transaction_id: impl Into<String>) -> RpcRequest {
        RpcRequest {
            service: self.service,
            method: self.method,
            data: self.data,
            transaction_id: transaction_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope_shape() {
        let request = RpcCall::new("story_service", "retrieve", json!({"entity_id": "s1"}))
            .into_request("tx-1");
        let frame = OutboundFrame::request("gateway_service", &request).unwrap();
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(
            value,
            json!({
                "correlation_id": "gateway_service",
                "method": "request",
                "data": {
                    "service": "story_service",
                    "method": "retrieve",
                    "data": {"entity_id": "s1"},
                    "transaction_id": "tx-1"
                }
            })
        );
        assert_eq!(frame.transaction_id(), Some("tx-1"));
        assert_eq!(frame.rpc_request().unwrap().service, "story_service");
    }

    #[test]
    fn test_control_envelope_shape() {
        let frame = OutboundFrame::control("gateway_service", FrameMethod::Unsubscribe, "story:1").unwrap();
        let json = serde_json::to_string(&frame).unwrap();

        assert!(json.contains(r#""method":"unsubscribe""#));
        assert_eq!(frame.channel(), Some("story:1"));
        assert!(frame.rpc_request().is_none());
        assert!(frame.transaction_id().is_none());
    }
}
