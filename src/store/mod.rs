//! Chat State Model
//!
//! In-memory state kept by the realtime client:
//!
//! - **MessageLog**: per-channel, insertion-ordered messages deduplicated by id
//! - **TypingState**: per-channel sets of users currently composing
//! - **ChatState**: the aggregate exposed to presentation layers
//!
//! Nothing here is persisted; a new process starts from empty state.

mod log;
mod state;
mod types;
mod typing;

pub use log::MessageLog;
pub use state::ChatState;
pub use types::{
    generate_message_id, Author, ChannelId, ConnectionState, Message, MessageId, UserId,
    LOCAL_USER_ID,
};
pub use typing::TypingState;
