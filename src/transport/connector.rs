//! Socket abstraction used by the transport
//!
//! A [`Connector`] turns a URL into a [`Socket`]: an outbound text channel
//! and an inbound stream of [`SocketEvent`]s. The transport only ever talks to
//! these channels, which keeps the real websocket and the in-memory test
//! socket interchangeable.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::TransportError;

/// Something that happened on an open socket
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    /// A text frame arrived
    Text(String),
    /// The socket closed. `clean` is false for abnormal termination.
    Closed {
        clean: bool,
        code: Option<u16>,
        reason: String,
    },
}

impl SocketEvent {
    /// Abnormal termination without a close handshake
    pub fn dropped(reason: impl Into<String>) -> Self {
        SocketEvent::Closed {
            clean: false,
            code: None,
            reason: reason.into(),
        }
    }
}

/// An open socket
///
/// Dropping `outbound` asks the underlying connection to close cleanly.
/// The send half reports closed once the connection can no longer write.
pub struct Socket {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<SocketEvent>,
}

/// Opens sockets for the transport
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a connection to `url`
    async fn connect(&self, url: &str) -> Result<Socket, TransportError>;
}
