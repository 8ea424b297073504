//! Websocket connector built on `tokio-tungstenite`

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use super::{Connector, Socket, SocketEvent, TransportError};

/// Connector that opens real websocket connections
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Socket, TransportError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let (mut sink, mut source) = stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        // Writer: forward outbound text until the transport lets go of the socket
        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    debug!(error = %e, "[ws] write failed");
                    return;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
        });

        // Reader: translate websocket messages into socket events
        tokio::spawn(async move {
            let closed = loop {
                match source.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if inbound_tx.send(SocketEvent::Text(text.as_str().to_owned())).is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (Some(u16::from(f.code)), f.reason.as_str().to_owned()))
                            .unwrap_or((None, String::new()));
                        break SocketEvent::Closed {
                            clean: true,
                            code,
                            reason,
                        };
                    }
                    Some(Ok(_)) => {} // Binary and control frames carry nothing for us
                    Some(Err(e)) => break SocketEvent::dropped(e.to_string()),
                    None => break SocketEvent::dropped("stream ended"),
                }
            };
            let _ = inbound_tx.send(closed);
        });

        Ok(Socket {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
