//! Typing indicator state
//!
//! Tracks which users are composing in each channel. Entries change only on
//! explicit start/stop signals; expiry is left to the presentation layer.

use std::collections::{HashMap, HashSet};

use super::types::{ChannelId, UserId};

/// Users currently typing, per channel
#[derive(Debug, Clone, Default)]
pub struct TypingState {
    channels: HashMap<ChannelId, HashSet<UserId>>,
}

impl TypingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a user as typing. Returns `true` if they were not already.
    pub fn start(&mut self, channel_id: &str, user_id: &str) -> bool {
        self.channels
            .entry(channel_id.to_string())
            .or_default()
            .insert(user_id.to_string())
    }

    /// Clear a user's typing flag. Returns `true` if it was set.
    pub fn stop(&mut self, channel_id: &str, user_id: &str) -> bool {
        let Some(users) = self.channels.get_mut(channel_id) else {
            return false;
        };

        let removed = users.remove(user_id);
        if users.is_empty() {
            self.channels.remove(channel_id);
        }
        removed
    }

    /// Users typing in a channel
    pub fn users(&self, channel_id: &str) -> impl Iterator<Item = &UserId> {
        self.channels.get(channel_id).into_iter().flatten()
    }

    /// Whether a user is typing in a channel
    pub fn is_typing(&self, channel_id: &str, user_id: &str) -> bool {
        self.channels
            .get(channel_id)
            .map(|users| users.contains(user_id))
            .unwrap_or(false)
    }

    /// Snapshot of a channel's typing set
    pub fn channel(&self, channel_id: &str) -> HashSet<UserId> {
        self.channels.get(channel_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(users: &[&str]) -> HashSet<UserId> {
        users.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_start_then_stop() {
        let mut typing = TypingState::new();
        assert!(typing.start("c1", "u1"));
        assert!(typing.is_typing("c1", "u1"));

        assert!(typing.stop("c1", "u1"));
        assert!(!typing.is_typing("c1", "u1"));
        assert!(typing.channel("c1").is_empty());
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut typing = TypingState::new();
        assert!(!typing.stop("c1", "u1"));

        typing.start("c1", "u2");
        assert!(!typing.stop("c1", "u1"));
        assert_eq!(typing.channel("c1"), set(&["u2"]));
    }

    #[test]
    fn test_multiple_users() {
        let mut typing = TypingState::new();
        typing.start("c1", "u1");
        typing.start("c1", "u2");
        assert_eq!(typing.channel("c1"), set(&["u1", "u2"]));

        typing.stop("c1", "u1");
        assert_eq!(typing.channel("c1"), set(&["u2"]));
        assert_eq!(typing.users("c1").count(), 1);
    }

    #[test]
    fn test_repeated_start_is_idempotent() {
        let mut typing = TypingState::new();
        assert!(typing.start("c1", "u1"));
        assert!(!typing.start("c1", "u1"));
        assert_eq!(typing.channel("c1").len(), 1);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut typing = TypingState::new();
        typing.start("c1", "u1");
        typing.start("c2", "u1");
        typing.stop("c1", "u1");

        assert!(!typing.is_typing("c1", "u1"));
        assert!(typing.is_typing("c2", "u1"));
    }
}
