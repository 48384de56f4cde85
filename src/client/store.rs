//! Realtime Client Store
//!
//! Owns the single logical connection to the message server and the chat
//! state derived from it.
//!
//! ## Lifecycle
//!
//! ```text
//! Disconnected --connect()--> Connecting --(open)--> Connected
//! Connected --disconnect() or (close)--> Disconnected
//! Connecting --(close)--> Disconnected
//! Disconnected --(reconnect delay after a close)--> Connecting
//! ```
//!
//! The store is event-driven and single-threaded: transport callbacks queue
//! on an internal channel and are applied by [`RealtimeClientStore::process_next`]
//! or [`RealtimeClientStore::process_pending`]. Every transport gets a new
//! session number; events from older sessions are dropped.

use std::future;
use std::pin::Pin;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Sleep};

use super::reconnect::ReconnectPolicy;
use crate::protocol::{Frame, FrameError, TypingSignal};
use crate::store::{
    Author, ChatState, ConnectionState, Message, MessageId, LOCAL_USER_ID,
};
use crate::transport::{EventSink, Link, SessionEvent, Transport, TransportEvent};

/// Reconnecting real-time chat client
pub struct RealtimeClientStore<T: Transport> {
    transport: T,
    /// Active transport, if any. At most one at a time.
    link: Option<T::Link>,
    /// Address of the last `connect`, reused by reconnects
    address: Option<String>,
    /// Session of the transport whose events are current
    session: u64,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    /// Pending reconnect. Replacing or clearing it cancels the old one.
    reconnect: Option<Pin<Box<Sleep>>>,
    policy: ReconnectPolicy,
    state: watch::Sender<ChatState>,
}

impl<T: Transport> RealtimeClientStore<T> {
    /// Create a store with the default reconnect policy
    ///
    /// Reconnects are timed with `tokio::time`, so closes must be processed
    /// inside a tokio runtime with the time driver enabled. Without one the
    /// store still tracks state but schedules no reconnect.
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, ReconnectPolicy::default())
    }

    pub fn with_policy(transport: T, policy: ReconnectPolicy) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ChatState::new());

        Self {
            transport,
            link: None,
            address: None,
            session: 0,
            events_tx,
            events_rx,
            reconnect: None,
            policy,
            state,
        }
    }

    /// Current chat state
    ///
    /// Do not hold the returned guard across an await point.
    pub fn state(&self) -> watch::Ref<'_, ChatState> {
        self.state.borrow()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.state.subscribe()
    }

    pub fn connection(&self) -> ConnectionState {
        self.state.borrow().connection()
    }

    /// Address of the most recent `connect`
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    /// When the pending reconnect fires, if one is scheduled
    pub fn reconnect_deadline(&self) -> Option<Instant> {
        self.reconnect.as_ref().map(|sleep| sleep.deadline())
    }

    /// Open a transport to `address`, replacing any current one
    pub fn connect(&mut self, address: &str) {
        self.cancel_reconnect();

        if let Some(mut link) = self.link.take() {
            tracing::debug!(session = self.session, "Closing previous transport");
            link.close();
        }

        self.session += 1;
        tracing::info!(%address, session = self.session, "Connecting");

        let sink = EventSink::new(self.session, self.events_tx.clone());
        self.link = Some(self.transport.open(address, sink));
        self.address = Some(address.to_string());
        self.set_connection(ConnectionState::Connecting);
    }

    /// Close the active transport without scheduling a reconnect
    pub fn disconnect(&mut self) {
        self.cancel_reconnect();

        let Some(mut link) = self.link.take() else {
            return;
        };

        link.close();
        // The close event of this transport belongs to a retired session
        self.session += 1;
        tracing::info!("Disconnected");
        self.set_connection(ConnectionState::Disconnected);
    }

    /// Send a message to a channel, adding it to the local log first
    ///
    /// Returns the provisional message id, or `None` if not connected.
    pub fn send_message(
        &mut self,
        channel_id: &str,
        content: &str,
        username: &str,
        display_name: &str,
    ) -> Option<MessageId> {
        if !self.can_send() {
            tracing::debug!(channel_id, state = %self.connection(), "Not connected, message dropped");
            return None;
        }

        let message = Message::provisional(channel_id, Author::local(username, display_name), content);
        let id = message.id.clone();

        self.state
            .send_if_modified(|state| state.append_message(message.clone()));
        self.transmit(&Frame::MessageCreate(message));

        Some(id)
    }

    /// Tell peers the local user started typing in a channel
    pub fn start_typing(&mut self, channel_id: &str) -> bool {
        self.send_typing(Frame::TypingStart(TypingSignal::new(channel_id, LOCAL_USER_ID)))
    }

    /// Tell peers the local user stopped typing in a channel
    pub fn stop_typing(&mut self, channel_id: &str) -> bool {
        self.send_typing(Frame::TypingEnd(TypingSignal::new(channel_id, LOCAL_USER_ID)))
    }

    /// Apply every transport event already queued. Does not fire timers.
    ///
    /// A close processed outside a tokio runtime is applied without
    /// scheduling a reconnect.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            processed += 1;
        }
        processed
    }

    /// Wait for the next transport event or reconnect deadline and apply it
    ///
    /// Cancel safe.
    pub async fn process_next(&mut self) {
        tokio::select! {
            Some(event) = self.events_rx.recv() => self.handle_event(event),
            () = reconnect_due(&mut self.reconnect) => self.reconnect_now(),
        }
    }

    fn handle_event(&mut self, SessionEvent { session, event }: SessionEvent) {
        if session != self.session {
            tracing::trace!(session, current = self.session, ?event, "Ignoring event from stale transport");
            return;
        }

        match event {
            TransportEvent::Opened => {
                tracing::info!(session, "Connected");
                self.set_connection(ConnectionState::Connected);
            }
            TransportEvent::Frame(text) => self.ingest(&text),
            TransportEvent::Error(reason) => {
                tracing::warn!(session, %reason, "Transport error");
            }
            TransportEvent::Closed => {
                self.link = None;
                self.set_connection(ConnectionState::Disconnected);
                self.schedule_reconnect();
            }
        }
    }

    fn ingest(&mut self, text: &str) {
        let frame = match Frame::decode(text) {
            Ok(frame) => frame,
            Err(FrameError::UnknownType(kind)) => {
                tracing::warn!(%kind, "Unhandled frame type");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed frame");
                return;
            }
        };

        let kind = frame.kind();
        let channel_id = frame.channel_id().to_string();

        if self.state.send_if_modified(|state| state.apply(frame)) {
            tracing::trace!(kind, %channel_id, "Applied frame");
        } else {
            tracing::debug!(kind, %channel_id, "Frame left state unchanged");
        }
    }

    fn send_typing(&mut self, frame: Frame) -> bool {
        if !self.can_send() {
            tracing::debug!(kind = frame.kind(), "Not connected, typing signal dropped");
            return false;
        }
        self.transmit(&frame)
    }

    fn can_send(&self) -> bool {
        self.link.is_some() && self.connection().is_connected()
    }

    fn transmit(&mut self, frame: &Frame) -> bool {
        let kind = frame.kind();
        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(kind, error = %e, "Failed to encode frame");
                return false;
            }
        };

        let Some(link) = self.link.as_mut() else {
            return false;
        };

        match link.send(text) {
            Ok(()) => {
                tracing::trace!(kind, "Sent frame");
                true
            }
            Err(e) => {
                tracing::warn!(kind, error = %e, "Failed to send frame");
                false
            }
        }
    }

    fn set_connection(&self, connection: ConnectionState) {
        self.state
            .send_if_modified(|state| state.set_connection(connection));
    }

    fn schedule_reconnect(&mut self) {
        let Some(address) = self.address.as_deref() else {
            return;
        };

        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!(%address, "Connection lost outside a tokio runtime, not reconnecting");
            return;
        }

        let delay = self.policy.delay();
        tracing::info!(%address, delay_ms = delay.as_millis() as u64, "Connection lost, scheduling reconnect");
        self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
    }

    fn cancel_reconnect(&mut self) {
        if self.reconnect.take().is_some() {
            tracing::debug!("Cancelled pending reconnect");
        }
    }

    fn reconnect_now(&mut self) {
        self.reconnect = None;
        if let Some(address) = self.address.clone() {
            tracing::info!(%address, "Reconnecting");
            self.connect(&address);
        }
    }
}

async fn reconnect_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => future::pending().await,
    }
}
