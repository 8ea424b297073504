//! Poker Realtime
//!
//! Client-side realtime core of a planning poker application: one websocket
//! connection to a gateway, request/response correlation on top of it, and
//! reactive entity caches that the server keeps current through push events.
//!
//! # Features
//!
//! - **Correlated RPC**: `send_and_wait` resolves with the matching `result` frame
//! - **Push fan-out**: listeners per event name, one-shot `asap` listeners
//! - **Auto-reconnect**: fixed delay after an unclean close, none after a clean one
//! - **Entity caches**: created/updated/deleted pushes keep collections in step
//! - **Selection cascade**: poker → story → events/pollings → votes
//!
//! # Modules
//!
//! - `store`: observable value cells
//! - `protocol`: wire frames and RPC envelopes
//! - `transport`: connection lifecycle, correlation, listeners, reconnect
//! - `types`: domain records (Poker, Story, Participant, Polling, Vote, ...)
//! - `entity`: generic entity cache and reconciliation rules
//! - `context`: per-kind contexts and the [`Session`] that wires them
//! - `config`: environment-driven client configuration
//! - `utils`: local persistence
//!
//! # Example
//!
//! ```no_run
//! use poker_realtime::{ClientConfig, Session, Transport};
//!
//! #[tokio::main]
//! async fn main() -> poker_realtime::Result<()> {
//!     let config = ClientConfig::from_env()?;
//!     let transport = Transport::websocket(config.transport());
//!     let session = Session::new(&transport);
//!     transport.init(config.connection_url());
//!     transport.until_connected().await;
//!
//!     let stories = session.stories.snapshot();
//!     println!("{} stories", stories.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod protocol;
pub mod store;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{ClientConfig, ConfigError};
pub use context::{
    EventContext, ParticipantContext, PokerContext, PollingContext, Session, StoryContext,
    VoteContext,
};
pub use entity::EntityCache;
pub use error::{Error, Result};
pub use protocol::{PushEvent, RpcCall, RpcResponse};
pub use store::{Store, Subscription};
pub use transport::{ConnectionState, RpcError, Transport, TransportConfig, TransportError};
pub use types::{Invite, Participant, Poker, PokerEvent, PokerEventKind, Polling, Story, Vote};
pub use utils::{participant_storage_key, LocalStored};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
