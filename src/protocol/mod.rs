//! Wire Protocol
//!
//! Closed set of frames exchanged with the real-time message server.
//!
//! ## Frames
//!
//! | `type`           | `data`                      |
//! |------------------|-----------------------------|
//! | `MESSAGE_CREATE` | a [`Message`](crate::store::Message) |
//! | `TYPING_START`   | `{channelId, userId}`       |
//! | `TYPING_END`     | `{channelId, userId}`       |
//!
//! Anything else decodes to [`FrameError::UnknownType`].

mod frames;

pub use frames::{Frame, FrameError, TypingSignal, MESSAGE_CREATE, TYPING_END, TYPING_START};
