//! Realtime transport over a single persistent socket
//!
//! The [`Transport`] multiplexes three kinds of traffic over one connection:
//! correlated request/response RPC, uncorrelated push events, and
//! subscribe/unsubscribe control frames that scope which channels the server
//! pushes to us.
//!
//! ## Connection lifecycle
//!
//! ```text
//! Disconnected ──init()──► Connecting ──open──► Connected
//!      ▲                        │                   │
//!      │                  connect failed          close
//!      └────────────────────────┴───────────────────┘
//!              unclean: restart() after reconnect_delay
//!              clean:   stay disconnected
//! ```
//!
//! On open the transport dispatches the client-local `connected` event, which
//! is what [`Transport::asap`] waits for. Requests in flight when a
//! connection drops are not replayed; they stay pending unless an RPC timeout
//! is configured.

mod connector;
mod error;
mod listeners;
pub mod memory;
mod websocket;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{
    FrameMethod, InboundFrame, OutboundFrame, PushEvent, RpcCall, RpcResponse, CONNECTED_EVENT,
    GATEWAY_SERVICE,
};
use crate::store::Store;

pub use connector::{Connector, Socket, SocketEvent};
pub use error::{RpcError, TransportError};
pub use listeners::{Callback, ListenerHandle};
pub use memory::{memory_pair, MemoryConnector, MemoryPeer, MemoryServer};
pub use websocket::WsConnector;

use listeners::{ListenerRegistry, PendingRequests};

/// Default delay before reconnecting after an abnormal close
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);

/// Transport tuning
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// `correlation_id` stamped on every outbound frame
    pub gateway_service: String,
    /// Fixed delay before `restart()` after an unclean close
    pub reconnect_delay: Duration,
    /// Give up on a pending request after this long. `None` waits forever.
    pub rpc_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            gateway_service: GATEWAY_SERVICE.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            rpc_timeout: None,
        }
    }
}

impl TransportConfig {
    pub fn with_gateway_service(mut self, service: impl Into<String>) -> Self {
        self.gateway_service = service.into();
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = Some(timeout);
        self
    }
}

/// Connection state as seen by the transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Shared handle to the connection, its listeners and pending requests.
///
/// Cloning is cheap; every clone drives the same connection. `init` and
/// every operation that schedules work must run inside a tokio runtime.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<Inner>,
}

struct Inner {
    config: TransportConfig,
    connector: Arc<dyn Connector>,
    url: Mutex<Option<String>>,
    socket: Mutex<Option<mpsc::UnboundedSender<String>>>,
    /// Bumped by every `init`/`close`; connection tasks of older generations are stale
    generation: AtomicU64,
    listeners: ListenerRegistry,
    pending: PendingRequests,
    state: Store<ConnectionState>,
    connected: Store<bool>,
    initiated: Store<bool>,
    opened: Notify,
}

impl Transport {
    /// Create a transport with default settings
    pub fn new(connector: impl Connector) -> Self {
        Self::with_config(connector, TransportConfig::default())
    }

    /// Create a transport with custom settings
    pub fn with_config(connector: impl Connector, config: TransportConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                connector: Arc::new(connector),
                url: Mutex::new(None),
                socket: Mutex::new(None),
                generation: AtomicU64::new(0),
                listeners: ListenerRegistry::default(),
                pending: PendingRequests::default(),
                state: Store::new(ConnectionState::Disconnected),
                connected: Store::new(false),
                initiated: Store::new(false),
                opened: Notify::new(),
            }),
        }
    }

    /// Create a transport that opens real websocket connections
    pub fn websocket(config: TransportConfig) -> Self {
        Self::with_config(WsConnector::new(), config)
    }

    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    // ─── Connection ──────────────────────────────────────────────────────

    /// Open a connection to `url`.
    ///
    /// Any previous connection is superseded: its events are ignored from
    /// now on and it will never trigger a reconnect.
    pub fn init(&self, url: impl Into<String>) {
        let url = url.into();
        *self.inner.url.lock() = Some(url.clone());
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        // Nothing reads the superseded socket any more
        self.inner.socket.lock().take();
        if self.inner.connected.get() {
            self.inner.connected.set(false);
        }
        self.inner.state.set(ConnectionState::Connecting);

        debug!(url = %url, generation, "[ws] connecting");
        let transport = self.clone();
        tokio::spawn(async move { transport.run_connection(url, generation).await });
    }

    /// Reconnect to the last URL passed to `init`
    pub fn restart(&self) {
        let url = self.inner.url.lock().clone();
        match url {
            Some(url) => self.init(url),
            None => warn!("[ws] restart requested before init"),
        }
    }

    /// Close the connection cleanly. No reconnect follows.
    pub fn close(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        // Dropping the sender makes the socket send its close frame
        self.inner.socket.lock().take();
        self.mark_disconnected();
        info!("[ws] connection closed by client");
    }

    async fn run_connection(self, url: String, generation: u64) {
        let socket = match self.inner.connector.connect(&url).await {
            Ok(socket) => socket,
            Err(e) => {
                warn!(error = %e, "[ws] connection failed");
                self.handle_close(generation, false);
                return;
            }
        };
        if self.is_stale(generation) {
            return;
        }

        let Socket {
            outbound,
            mut inbound,
        } = socket;
        *self.inner.socket.lock() = Some(outbound);
        self.inner.state.set(ConnectionState::Connected);
        self.inner.connected.set(true);
        self.inner.initiated.set(true);
        self.inner.opened.notify_waiters();
        info!(url = %url, "[ws] established websocket connection");
        self.dispatch(&PushEvent::connected());

        while let Some(event) = inbound.recv().await {
            if self.is_stale(generation) {
                return;
            }
            match event {
                SocketEvent::Text(text) => self.propagate(&text),
                SocketEvent::Closed {
                    clean,
                    code,
                    reason,
                } => {
                    if clean {
                        info!(?code, reason = %reason, "[ws] connection closed cleanly");
                    } else {
                        warn!(reason = %reason, "[ws] connection died");
                    }
                    self.handle_close(generation, clean);
                    return;
                }
            }
        }

        self.handle_close(generation, false);
    }

    fn handle_close(&self, generation: u64, clean: bool) {
        if self.is_stale(generation) {
            return;
        }
        self.inner.socket.lock().take();
        self.mark_disconnected();

        if clean {
            return;
        }
        let delay = self.inner.config.reconnect_delay;
        debug!(delay_ms = delay.as_millis() as u64, "[ws] scheduling reconnect");
        let transport = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !transport.is_stale(generation) {
                transport.restart();
            }
        });
    }

    fn mark_disconnected(&self) {
        self.inner.state.set(ConnectionState::Disconnected);
        self.inner.connected.set(false);
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) != generation
    }

    // ─── Outbound ────────────────────────────────────────────────────────

    /// Send a request without waiting for its result.
    ///
    /// Returns the generated transaction id, or `Disconnected` if no socket
    /// is open; in that case nothing was sent.
    pub fn send(&self, call: RpcCall) -> Result<String, TransportError> {
        let transaction_id = new_transaction_id();
        self.write_request(call, &transaction_id)?;
        Ok(transaction_id)
    }

    /// Send a request and wait for the `result` frame with the same
    /// transaction id.
    ///
    /// The correlation entry is registered before the frame is written, so a
    /// result can never overtake its waiter.
    pub async fn send_and_wait(&self, call: RpcCall) -> Result<RpcResponse, RpcError> {
        let transaction_id = new_transaction_id();
        // Dropping this future at any await releases the entry
        let (_entry, rx) = self.inner.pending.track(&transaction_id);
        self.write_request(call, &transaction_id)?;

        let response = match self.inner.config.rpc_timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    return Err(RpcError::Timeout {
                        transaction_id,
                        timeout_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => rx.await,
        }
        .map_err(|_| RpcError::Dropped)?;

        if response.success {
            Ok(response)
        } else {
            Err(RpcError::Rejected(Box::new(response)))
        }
    }

    /// Ask the server to start pushing events for `channel`
    pub fn subscribe(&self, channel: &str) {
        self.write_control(FrameMethod::Subscribe, channel);
    }

    /// Ask the server to stop pushing events for `channel`
    pub fn unsubscribe(&self, channel: &str) {
        self.write_control(FrameMethod::Unsubscribe, channel);
    }

    fn write_request(&self, call: RpcCall, transaction_id: &str) -> Result<(), TransportError> {
        let request = call.into_request(transaction_id);
        let frame = OutboundFrame::request(&self.inner.config.gateway_service, &request)?;
        debug!(
            service = %request.service,
            method = %request.method,
            transaction_id,
            "[ws] sending request"
        );
        self.write(&frame)
    }

    fn write_control(&self, method: FrameMethod, channel: &str) {
        let result = OutboundFrame::control(&self.inner.config.gateway_service, method, channel)
            .map_err(TransportError::from)
            .and_then(|frame| self.write(&frame));
        if let Err(e) = result {
            warn!(error = %e, ?method, channel, "[ws] control frame not sent");
        }
    }

    fn write(&self, frame: &OutboundFrame) -> Result<(), TransportError> {
        let text = serde_json::to_string(frame)?;
        let socket = self.inner.socket.lock();
        match socket.as_ref() {
            Some(tx) if !tx.is_closed() => tx.send(text).map_err(|_| TransportError::Disconnected),
            _ => Err(TransportError::Disconnected),
        }
    }

    // ─── Inbound ─────────────────────────────────────────────────────────

    /// Register a standing callback for push events named `event`
    pub fn listen(
        &self,
        event: impl AsRef<str>,
        callback: impl Fn(&PushEvent) + Send + Sync + 'static,
    ) -> ListenerHandle {
        self.inner.listeners.register(event.as_ref(), Arc::new(callback))
    }

    /// Deregister a listener. Returns false if it was already removed.
    pub fn unlisten(&self, handle: ListenerHandle) -> bool {
        self.inner.listeners.remove(handle)
    }

    /// Run `callback` now if connected, otherwise once the next connection opens
    pub fn asap(&self, callback: impl FnOnce() + Send + 'static) {
        if self.is_connected() {
            callback();
            return;
        }

        let slot = Arc::new(Mutex::new(Some(callback)));
        let handle = self.inner.listeners.reserve();
        let registry = Arc::downgrade(&self.inner);
        let deferred = Arc::clone(&slot);
        self.inner.listeners.insert(
            handle,
            CONNECTED_EVENT,
            Arc::new(move |_| {
                let callback = deferred.lock().take();
                if let Some(inner) = registry.upgrade() {
                    inner.listeners.remove(handle);
                }
                if let Some(callback) = callback {
                    callback();
                }
            }),
        );

        // The connection may have opened between the check and the registration
        if self.is_connected() {
            let callback = slot.lock().take();
            if let Some(callback) = callback {
                self.inner.listeners.remove(handle);
                callback();
            }
        }
    }

    /// Route one raw inbound frame.
    ///
    /// `result` frames resolve the matching pending request; `event` frames
    /// fan out to every listener for the event name, in registration order.
    /// Malformed frames are dropped.
    pub fn propagate(&self, raw: &str) {
        debug!(frame = raw, "[ws] received message");
        let frame: InboundFrame = match serde_json::from_str(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "[ws] dropping malformed frame");
                return;
            }
        };

        match frame {
            InboundFrame::Result { data } => {
                let transaction_id = data.transaction_id.clone();
                if !self.inner.pending.resolve(data) {
                    debug!(transaction_id = %transaction_id, "[ws] no pending request for result");
                }
            }
            InboundFrame::Event { event, data } => {
                if event == CONNECTED_EVENT {
                    warn!("[ws] ignoring server-sent connected event");
                    return;
                }
                self.dispatch(&PushEvent { event, data });
            }
        }
    }

    fn dispatch(&self, event: &PushEvent) {
        for callback in self.inner.listeners.matching(&event.event) {
            callback(event);
        }
    }

    // ─── Observable state ────────────────────────────────────────────────

    /// Live connection flag
    pub fn connected(&self) -> &Store<bool> {
        &self.inner.connected
    }

    /// Set once any connection has opened
    pub fn initiated(&self) -> &Store<bool> {
        &self.inner.initiated
    }

    pub fn state(&self) -> &Store<ConnectionState> {
        &self.inner.state
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.get()
    }

    /// Wait until a connection is open
    pub async fn until_connected(&self) {
        loop {
            let opened = self.inner.opened.notified();
            if self.is_connected() {
                return;
            }
            opened.await;
        }
    }

    /// Last URL passed to `init`
    pub fn url(&self) -> Option<String> {
        self.inner.url.lock().clone()
    }

    /// Requests still waiting for their result
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.len()
    }

    /// Registered listeners, including pending `asap` callbacks
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }
}

/// Random correlation id (UUID v4, 122 random bits)
fn new_transaction_id() -> String {
    Uuid::new_v4().to_string()
}
