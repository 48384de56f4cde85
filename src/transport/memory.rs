//! In-process transport
//!
//! Records every connection the store opens and lets the caller play the
//! server side: open it, push frames, fail it, close it, and inspect what the
//! store sent. Used by tests and benchmarks; like any transport it expects
//! the store to run inside a tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{EventSink, Link, Transport, TransportError};

#[derive(Debug)]
struct ConnectionInner {
    address: String,
    sink: EventSink,
    sent: Vec<String>,
    closed: bool,
}

/// Server-side view of one connection opened through [`MemoryTransport`]
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    inner: Arc<Mutex<ConnectionInner>>,
}

impl MemoryConnection {
    fn lock(&self) -> MutexGuard<'_, ConnectionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Address the store asked for
    pub fn address(&self) -> String {
        self.lock().address.clone()
    }

    /// Session the connection reports for
    pub fn session(&self) -> u64 {
        self.lock().sink.session()
    }

    /// Complete the handshake
    pub fn open(&self) {
        self.lock().sink.opened();
    }

    /// Deliver an inbound text frame
    pub fn deliver(&self, text: impl Into<String>) {
        self.lock().sink.frame(text);
    }

    /// Report a transport error
    pub fn fail(&self, reason: impl Into<String>) {
        self.lock().sink.error(reason);
    }

    /// Close from the server side
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.sink.closed();
    }

    /// Frames the store transmitted, oldest first
    pub fn sent(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// Whether either side closed the connection
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// Store-side handle of a [`MemoryConnection`]
#[derive(Debug)]
pub struct MemoryLink {
    connection: MemoryConnection,
}

impl Link for MemoryLink {
    fn send(&mut self, text: String) -> Result<(), TransportError> {
        let mut inner = self.connection.lock();
        if inner.closed {
            return Err(TransportError::Closed);
        }
        inner.sent.push(text);
        Ok(())
    }

    fn close(&mut self) {
        let mut inner = self.connection.lock();
        if !inner.closed {
            inner.closed = true;
            inner.sink.closed();
        }
    }
}

/// Transport that keeps connections in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    connections: Arc<Mutex<Vec<MemoryConnection>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MemoryConnection>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of connections opened so far
    pub fn opened(&self) -> usize {
        self.lock().len()
    }

    /// Connection by open order
    pub fn connection(&self, index: usize) -> Option<MemoryConnection> {
        self.lock().get(index).cloned()
    }

    /// Most recently opened connection
    pub fn last(&self) -> Option<MemoryConnection> {
        self.lock().last().cloned()
    }
}

impl Transport for MemoryTransport {
    type Link = MemoryLink;

    fn open(&self, address: &str, events: EventSink) -> MemoryLink {
        let connection = MemoryConnection {
            inner: Arc::new(Mutex::new(ConnectionInner {
                address: address.to_string(),
                sink: events,
                sent: Vec::new(),
                closed: false,
            })),
        };
        self.lock().push(connection.clone());
        MemoryLink { connection }
    }
}
