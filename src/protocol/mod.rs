//! Wire protocol types for the gateway connection
//!
//! Outbound frames wrap either an RPC request or a channel control message in
//! an [`OutboundFrame`] envelope. Inbound frames are either correlated RPC
//! results or uncorrelated push events, see [`InboundFrame`].

mod envelope;
mod frame;

pub use envelope::{ChannelControl, FrameMethod, OutboundFrame, RpcCall, RpcRequest};
pub use frame::{InboundFrame, PushEvent, RpcResponse, CONNECTED_EVENT};

/// Default `correlation_id` of every outbound frame
pub const GATEWAY_SERVICE: &str = "gateway_service";
