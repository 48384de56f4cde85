//! # Chatsync
//!
//! Real-time chat client core - the synchronizer between a chat UI and a
//! WebSocket message server.
//!
//! ## Features
//!
//! - **Single connection**: at most one transport open at a time
//! - **Automatic reconnect**: fixed-delay retries after the connection drops
//! - **Deduplicated logs**: per-channel message history, one entry per id
//! - **Typing indicators**: per-channel sets of users currently composing
//! - **Optimistic sends**: outbound messages appear locally before the server
//!   sees them
//!
//! ## Modules
//!
//! - [`client`]: The reconnecting realtime store and its task handle
//! - [`store`]: Chat state model (messages, typing, connection status)
//! - [`protocol`]: Wire frames and their JSON encoding
//! - [`transport`]: WebSocket and in-memory transports
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatsync::{RealtimeClientStore, WsTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = RealtimeClientStore::new(WsTransport::default());
//!     store.connect("ws://localhost:9001");
//!
//!     // Apply transport events until connected
//!     while !store.connection().is_connected() {
//!         store.process_next().await;
//!     }
//!
//!     store.send_message("general", "hello", "ada", "Ada");
//!     println!("{} messages", store.state().channel_messages("general").len());
//!
//!     store.disconnect();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod protocol;
pub mod store;
pub mod transport;

// Re-export top-level types for convenience
pub use client::{ReconnectPolicy, RealtimeClientStore, StoreError, StoreHandle};

pub use store::{
    Author, ChannelId, ChatState, ConnectionState, Message, MessageId, MessageLog, TypingState,
    UserId, LOCAL_USER_ID,
};

pub use protocol::{Frame, FrameError, TypingSignal};

pub use transport::{
    EventSink, Link, MemoryTransport, Transport, TransportError, TransportEvent, WsTransport,
};

pub use config::{ClientConfig, Config, ConfigError, IdentityConfig, LoggingConfig};
