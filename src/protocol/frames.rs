//! Wire frame types
//!
//! Every frame is a JSON object `{"type": <discriminator>, "data": <payload>}`
//! carried in a single WebSocket text message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{ChannelId, Message, UserId};

pub const MESSAGE_CREATE: &str = "MESSAGE_CREATE";
pub const TYPING_START: &str = "TYPING_START";
pub const TYPING_END: &str = "TYPING_END";

/// Frames exchanged with the message server (both directions)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frame {
    /// A new message in a channel
    MessageCreate(Message),
    /// A user started composing in a channel
    TypingStart(TypingSignal),
    /// A user stopped composing in a channel
    TypingEnd(TypingSignal),
}

/// Payload of typing start/end frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingSignal {
    pub channel_id: ChannelId,
    pub user_id: UserId,
}

impl TypingSignal {
    pub fn new(channel_id: impl Into<ChannelId>, user_id: impl Into<UserId>) -> Self {
        Self {
            channel_id: channel_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Envelope used to read the discriminator before the payload
#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl Frame {
    /// Decode a text frame
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let raw: RawFrame = serde_json::from_str(text).map_err(FrameError::Malformed)?;

        let frame = match raw.kind.as_str() {
            MESSAGE_CREATE => Frame::MessageCreate(payload(&raw)?),
            TYPING_START => Frame::TypingStart(payload(&raw)?),
            TYPING_END => Frame::TypingEnd(payload(&raw)?),
            _ => return Err(FrameError::UnknownType(raw.kind)),
        };

        Ok(frame)
    }

    /// Encode as a text frame
    pub fn encode(&self) -> Result<String, FrameError> {
        serde_json::to_string(self).map_err(FrameError::Encode)
    }

    /// Wire discriminator of this frame
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::MessageCreate(_) => MESSAGE_CREATE,
            Frame::TypingStart(_) => TYPING_START,
            Frame::TypingEnd(_) => TYPING_END,
        }
    }

    /// Channel the frame refers to
    pub fn channel_id(&self) -> &str {
        match self {
            Frame::MessageCreate(message) => &message.channel_id,
            Frame::TypingStart(signal) | Frame::TypingEnd(signal) => &signal.channel_id,
        }
    }
}

fn payload<T: serde::de::DeserializeOwned>(raw: &RawFrame) -> Result<T, FrameError> {
    T::deserialize(&raw.data).map_err(|source| FrameError::InvalidPayload {
        kind: raw.kind.clone(),
        source,
    })
}

/// Errors decoding or encoding frames
#[derive(Debug, Error)]
pub enum FrameError {
    /// Not JSON, or no `type` discriminator
    #[error("Malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Known discriminator with a payload of the wrong shape
    #[error("Invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// Discriminator this client does not handle
    #[error("Unhandled frame type: {0}")]
    UnknownType(String),

    #[error("Failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Author;

    const MESSAGE_JSON: &str = r#"{
        "type": "MESSAGE_CREATE",
        "data": {
            "id": "m1",
            "channelId": "c1",
            "content": "hi",
            "userId": "u1",
            "user": {"id": "u1", "username": "bob", "displayName": "Bob"},
            "timestamp": "2024-05-01T12:00:00.000Z"
        }
    }"#;

    #[test]
    fn test_decode_message_create() {
        let frame = Frame::decode(MESSAGE_JSON).unwrap();
        match frame {
            Frame::MessageCreate(msg) => {
                assert_eq!(msg.id, "m1");
                assert_eq!(msg.channel_id, "c1");
                assert_eq!(msg.content, "hi");
                assert_eq!(msg.user.username, "bob");
            }
            other => panic!("Expected MessageCreate, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_typing() {
        let json = r#"{"type": "TYPING_START", "data": {"channelId": "c1", "userId": "u1"}}"#;
        let frame = Frame::decode(json).unwrap();
        assert_eq!(frame, Frame::TypingStart(TypingSignal::new("c1", "u1")));

        let json = r#"{"type": "TYPING_END", "data": {"channelId": "c1", "userId": "u1"}}"#;
        let frame = Frame::decode(json).unwrap();
        assert_eq!(frame.kind(), TYPING_END);
        assert_eq!(frame.channel_id(), "c1");
    }

    #[test]
    fn test_decode_unknown_type() {
        let json = r#"{"type": "PRESENCE_UPDATE", "data": {"userId": "u1"}}"#;
        let err = Frame::decode(json).unwrap_err();
        assert!(matches!(err, FrameError::UnknownType(ref t) if t == "PRESENCE_UPDATE"));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            Frame::decode("not json").unwrap_err(),
            FrameError::Malformed(_)
        ));
        assert!(matches!(
            Frame::decode(r#"{"data": {}}"#).unwrap_err(),
            FrameError::Malformed(_)
        ));
    }

    #[test]
    fn test_decode_invalid_payload() {
        let json = r#"{"type": "TYPING_START", "data": {"channelId": "c1"}}"#;
        let err = Frame::decode(json).unwrap_err();
        assert!(matches!(err, FrameError::InvalidPayload { ref kind, .. } if kind == TYPING_START));

        let json = r#"{"type": "MESSAGE_CREATE"}"#;
        assert!(matches!(
            Frame::decode(json).unwrap_err(),
            FrameError::InvalidPayload { .. }
        ));
    }

    #[test]
    fn test_encode_uses_type_and_data() {
        let frame = Frame::TypingEnd(TypingSignal::new("c1", "current-user"));
        let json: serde_json::Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();

        assert_eq!(json["type"], "TYPING_END");
        assert_eq!(json["data"]["channelId"], "c1");
        assert_eq!(json["data"]["userId"], "current-user");
    }

    #[test]
    fn test_encode_provisional_message() {
        let msg = Message::provisional("c1", Author::local("ada", "Ada"), "hello");
        let frame = Frame::MessageCreate(msg.clone());
        let text = frame.encode().unwrap();

        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["type"], "MESSAGE_CREATE");
        assert_eq!(json["data"]["isOptimistic"], true);
        assert_eq!(json["data"]["user"]["username"], "ada");

        // Peers running this client can read what it sends
        assert_eq!(Frame::decode(&text).unwrap(), frame);
    }
}
