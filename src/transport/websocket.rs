//! WebSocket Transport
//!
//! Client connections over tokio-tungstenite. Each connection runs in its own
//! task that forwards inbound text frames to the [`EventSink`] and drains the
//! link's outbound queue into the socket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use super::{EventSink, Link, Transport, TransportError};

/// Handshake timeout used when none is configured
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Instructions from the link to its connection task
#[derive(Debug)]
enum Outgoing {
    Text(String),
    Close,
}

/// Opens WebSocket connections
///
/// `open` spawns onto the current tokio runtime, so it must be called from
/// within one.
#[derive(Debug, Clone)]
pub struct WsTransport {
    connect_timeout: Duration,
}

impl WsTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl Transport for WsTransport {
    type Link = WsLink;

    fn open(&self, address: &str, events: EventSink) -> WsLink {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(
            address.to_string(),
            self.connect_timeout,
            events,
            rx,
        ));

        WsLink {
            outgoing: tx,
            closed: false,
        }
    }
}

/// Store-side handle of a WebSocket connection
#[derive(Debug)]
pub struct WsLink {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    closed: bool,
}

impl Link for WsLink {
    fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            // Task may have exited already; dropping the sender stops it too
            let _ = self.outgoing.send(Outgoing::Close);
        }
    }
}

/// Drive one connection from handshake to close
async fn run_connection(
    address: String,
    connect_timeout: Duration,
    events: EventSink,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
) {
    let session = events.session();

    let socket = match tokio::time::timeout(connect_timeout, connect_async(address.as_str())).await
    {
        Ok(Ok((socket, _response))) => socket,
        Ok(Err(e)) => {
            tracing::warn!(%address, session, error = %e, "WebSocket handshake failed");
            events.error(e.to_string());
            events.closed();
            return;
        }
        Err(_) => {
            tracing::warn!(%address, session, timeout = ?connect_timeout, "WebSocket handshake timed out");
            events.error(format!("connect timed out after {:?}", connect_timeout));
            events.closed();
            return;
        }
    };

    tracing::debug!(%address, session, "WebSocket open");
    events.opened();

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            out = outgoing.recv() => match out {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = sender.send(WsMessage::Text(text)).await {
                        tracing::debug!(session, error = %e, "WebSocket send failed");
                        events.error(e.to_string());
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = sender.close().await;
                    break;
                }
            },
            inbound = receiver.next() => match inbound {
                Some(Ok(WsMessage::Text(text))) => events.frame(text),
                Some(Ok(WsMessage::Close(frame))) => {
                    tracing::debug!(session, ?frame, "Server closed WebSocket");
                    break;
                }
                // Binary frames are not part of the protocol; ping/pong is handled by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(session, error = %e, "WebSocket receive error");
                    events.error(e.to_string());
                    break;
                }
                None => break,
            },
        }
    }

    tracing::debug!(%address, session, "WebSocket closed");
    events.closed();
}
