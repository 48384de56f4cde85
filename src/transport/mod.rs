//! Transport Layer
//!
//! Abstracts the bidirectional text connection under the realtime store.
//!
//! ## Architecture
//!
//! - **Transport**: opens a connection to an address and returns a [`Link`]
//! - **Link**: send text frames, close the connection
//! - **EventSink**: callback surface a transport reports lifecycle and
//!   inbound frames through (`opened`, `frame`, `error`, `closed`)
//!
//! Opening never blocks; the outcome arrives later through the sink. Each
//! sink is bound to one store session, so events from a transport the store
//! has since replaced are recognised as stale.

mod memory;
mod websocket;

pub use memory::{MemoryConnection, MemoryLink, MemoryTransport};
pub use websocket::{WsLink, WsTransport};

use thiserror::Error;
use tokio::sync::mpsc;

/// Opens connections for the realtime store
pub trait Transport {
    /// Handle to one open (or opening) connection
    type Link: Link;

    /// Start connecting to `address`, reporting progress through `events`
    fn open(&self, address: &str, events: EventSink) -> Self::Link;
}

/// Outbound half of a connection
pub trait Link {
    /// Queue a text frame for transmission
    fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection. Idempotent.
    fn close(&mut self);
}

/// Something that happened on a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established
    Opened,
    /// Inbound text frame
    Frame(String),
    /// Transport-level error (a close usually follows)
    Error(String),
    /// Connection gone, whether closed by either side or failed
    Closed,
}

/// Transport event tagged with the session that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionEvent {
    pub session: u64,
    pub event: TransportEvent,
}

/// Reports transport events back to the store
#[derive(Debug, Clone)]
pub struct EventSink {
    session: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    pub(crate) fn new(session: u64, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { session, tx }
    }

    /// Session this sink reports for
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn opened(&self) {
        self.emit(TransportEvent::Opened);
    }

    pub fn frame(&self, text: impl Into<String>) {
        self.emit(TransportEvent::Frame(text.into()));
    }

    pub fn error(&self, reason: impl Into<String>) {
        self.emit(TransportEvent::Error(reason.into()));
    }

    pub fn closed(&self) {
        self.emit(TransportEvent::Closed);
    }

    fn emit(&self, event: TransportEvent) {
        // The store may already be gone; nothing left to notify then
        let _ = self.tx.send(SessionEvent {
            session: self.session,
            event,
        });
    }
}

/// Errors from a transport link
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,

    #[error("Send failed: {0}")]
    Send(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_tags_events_with_session() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(7, tx);

        sink.opened();
        sink.frame("hello");
        sink.closed();

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            events,
            vec![
                SessionEvent { session: 7, event: TransportEvent::Opened },
                SessionEvent { session: 7, event: TransportEvent::Frame("hello".into()) },
                SessionEvent { session: 7, event: TransportEvent::Closed },
            ]
        );
    }

    #[test]
    fn test_sink_survives_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = EventSink::new(1, tx);
        sink.error("boom");
    }
}
