//! Observable chat state
//!
//! [`ChatState`] is what presentation layers read and re-render from:
//! connection status, per-channel messages and per-channel typing sets.

use std::collections::HashSet;

use super::log::MessageLog;
use super::types::{ConnectionState, Message, UserId};
use super::typing::TypingState;
use crate::protocol::Frame;

/// Aggregate state owned by the realtime store
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    connection: ConnectionState,
    messages: MessageLog,
    typing: TypingState,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current connection status
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// All channel logs
    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    /// All typing sets
    pub fn typing(&self) -> &TypingState {
        &self.typing
    }

    /// Messages of one channel
    pub fn channel_messages(&self, channel_id: &str) -> &[Message] {
        self.messages.channel(channel_id)
    }

    /// Users typing in one channel
    pub fn typing_users(&self, channel_id: &str) -> HashSet<UserId> {
        self.typing.channel(channel_id)
    }

    /// Update connection status. Returns `true` if it changed.
    pub(crate) fn set_connection(&mut self, connection: ConnectionState) -> bool {
        if self.connection == connection {
            return false;
        }
        self.connection = connection;
        true
    }

    /// Add a message to the log. Returns `false` for duplicates.
    pub(crate) fn append_message(&mut self, message: Message) -> bool {
        self.messages.append(message)
    }

    /// Apply an inbound frame. Returns `true` if anything changed.
    pub fn apply(&mut self, frame: Frame) -> bool {
        match frame {
            Frame::MessageCreate(message) => self.messages.append(message),
            Frame::TypingStart(signal) => self.typing.start(&signal.channel_id, &signal.user_id),
            Frame::TypingEnd(signal) => self.typing.stop(&signal.channel_id, &signal.user_id),
        }
    }
}
