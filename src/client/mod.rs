//! Realtime Client
//!
//! The reconnecting synchronizer between a message server and local chat
//! state.
//!
//! ## Architecture
//!
//! - **RealtimeClientStore**: connection lifecycle, reconnect scheduling,
//!   inbound frame ingestion and outbound operations
//! - **ReconnectPolicy**: fixed delay between attempts (3000 ms by default)
//! - **StoreHandle**: cloneable command/state handle to a store running on
//!   its own task
//!
//! ## Example
//!
//! ```rust,no_run
//! use chatsync::client::RealtimeClientStore;
//! use chatsync::transport::WsTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (handle, task) = RealtimeClientStore::new(WsTransport::default()).spawn();
//!     handle.connect("ws://localhost:9001")?;
//!
//!     let mut updates = handle.subscribe();
//!     while updates.changed().await.is_ok() {
//!         let state = updates.borrow_and_update();
//!         println!("{} messages in #general", state.channel_messages("general").len());
//!     }
//!
//!     task.await?;
//!     Ok(())
//! }
//! ```

mod error;
mod handle;
mod reconnect;
mod store;

pub use error::{StoreError, StoreResult};
pub use handle::StoreHandle;
pub use reconnect::{ReconnectPolicy, DEFAULT_RECONNECT_DELAY};
pub use store::RealtimeClientStore;
