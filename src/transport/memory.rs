//! In-process connector
//!
//! [`memory_pair`] returns a [`MemoryConnector`] for the transport and a
//! [`MemoryServer`] that accepts every connection the transport opens as a
//! [`MemoryPeer`]. Peers read the client's frames and inject frames and
//! closes, which makes connection behaviour fully deterministic in tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::protocol::{InboundFrame, OutboundFrame, PushEvent, RpcResponse};

use super::{Connector, Socket, SocketEvent, TransportError};

/// Create a connected connector/server pair
pub fn memory_pair() -> (MemoryConnector, MemoryServer) {
    let (peers_tx, peers_rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared::default());
    (
        MemoryConnector {
            peers: peers_tx,
            shared: Arc::clone(&shared),
        },
        MemoryServer {
            peers: peers_rx,
            shared,
        },
    )
}

#[derive(Default)]
struct Shared {
    attempts: Mutex<Vec<String>>,
    refuse: AtomicUsize,
}

/// Client half: hands each new socket to the paired [`MemoryServer`]
pub struct MemoryConnector {
    peers: mpsc::UnboundedSender<MemoryPeer>,
    shared: Arc<Shared>,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<Socket, TransportError> {
        self.shared.attempts.lock().push(url.to_string());

        let refused = self
            .shared
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(TransportError::Connect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let peer = MemoryPeer {
            url: url.to_string(),
            frames: outbound_rx,
            events: inbound_tx,
        };
        self.peers.send(peer).map_err(|_| TransportError::Connect {
            url: url.to_string(),
            reason: "memory server dropped".to_string(),
        })?;

        Ok(Socket {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// Server half: yields one [`MemoryPeer`] per accepted connection
pub struct MemoryServer {
    peers: mpsc::UnboundedReceiver<MemoryPeer>,
    shared: Arc<Shared>,
}

impl MemoryServer {
    /// Wait for the next connection
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.peers.recv().await
    }

    /// Next connection, if one is already waiting
    pub fn try_accept(&mut self) -> Option<MemoryPeer> {
        self.peers.try_recv().ok()
    }

    /// URLs of every connection attempt so far, refused ones included
    pub fn attempts(&self) -> Vec<String> {
        self.shared.attempts.lock().clone()
    }

    /// Fail the next `count` connection attempts
    pub fn refuse_next(&self, count: usize) {
        self.shared.refuse.store(count, Ordering::SeqCst);
    }
}

/// Server view of one connection
pub struct MemoryPeer {
    url: String,
    frames: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<SocketEvent>,
}

impl MemoryPeer {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver a raw text frame. Returns false once the client went away.
    pub fn send_text(&self, raw: impl Into<String>) -> bool {
        self.events.send(SocketEvent::Text(raw.into())).is_ok()
    }

    /// Deliver an `event` frame
    pub fn push(&self, event: &str, data: Value) -> bool {
        self.send_frame(&PushEvent::new(event, data).into_frame())
    }

    /// Deliver a `result` frame
    pub fn reply(&self, response: RpcResponse) -> bool {
        self.send_frame(&response.into_frame())
    }

    fn send_frame(&self, frame: &InboundFrame) -> bool {
        match serde_json::to_string(frame) {
            Ok(text) => self.send_text(text),
            Err(_) => false,
        }
    }

    /// Close the connection, cleanly or abnormally
    pub fn close(&self, clean: bool) {
        let event = if clean {
            SocketEvent::Closed {
                clean: true,
                code: Some(1000),
                reason: "normal closure".to_string(),
            }
        } else {
            SocketEvent::dropped("connection reset")
        };
        let _ = self.events.send(event);
    }

    /// Next frame written by the client, `None` once it let go of the socket
    pub async fn next_frame(&mut self) -> Option<OutboundFrame> {
        let text = self.frames.recv().await?;
        serde_json::from_str(&text).ok()
    }

    /// Next frame if one is already buffered
    pub fn try_next_frame(&mut self) -> Option<OutboundFrame> {
        let text = self.frames.try_recv().ok()?;
        serde_json::from_str(&text).ok()
    }

    /// Every buffered frame
    pub fn drain_frames(&mut self) -> Vec<OutboundFrame> {
        std::iter::from_fn(|| self.try_next_frame()).collect()
    }
}
