//! Core chat data types
//!
//! Defines the message and connection types shared by the store, the wire
//! protocol and presentation layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a channel (or direct-message conversation)
pub type ChannelId = String;

/// Identifier of a user
pub type UserId = String;

/// Identifier of a message, unique within a channel
pub type MessageId = String;

/// Author id stamped on everything this client sends
pub const LOCAL_USER_ID: &str = "current-user";

/// Connection status of the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport, or the last one closed
    #[default]
    Disconnected,
    /// Transport opened, handshake in flight
    Connecting,
    /// Transport established
    Connected,
}

impl ConnectionState {
    /// Whether outbound frames may be sent
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        write!(f, "{}", s)
    }
}

/// Display metadata for a message author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    #[serde(default, alias = "avatarUrl", skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Author {
    /// Author record for the local user
    pub fn local(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: LOCAL_USER_ID.to_string(),
            username: username.into(),
            display_name: display_name.into(),
            avatar: None,
        }
    }
}

/// A chat message as carried on the wire and kept in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub user: Author,
    #[serde(alias = "createdAt")]
    pub timestamp: DateTime<Utc>,
    /// Set on entries added locally before the server has seen them
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_optimistic: bool,
}

impl Message {
    /// Create a confirmed message stamped now
    pub fn new(
        id: impl Into<MessageId>,
        channel_id: impl Into<ChannelId>,
        author: Author,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            channel_id: channel_id.into(),
            user_id: author.id.clone(),
            user: author,
            timestamp: Utc::now(),
            is_optimistic: false,
        }
    }

    /// Create a provisional message with a fresh random id
    pub fn provisional(
        channel_id: impl Into<ChannelId>,
        author: Author,
        content: impl Into<String>,
    ) -> Self {
        let mut message = Self::new(generate_message_id(), channel_id, author, content);
        message.is_optimistic = true;
        message
    }
}

/// Generate a random message id
pub fn generate_message_id() -> MessageId {
    Uuid::new_v4().simple().to_string()
}
