//! Per-channel message log
//!
//! Append-only, insertion-ordered message sequences keyed by channel.
//! Each channel keeps an id index so duplicate arrivals are rejected in O(1).

use std::collections::{HashMap, HashSet};

use super::types::{ChannelId, Message, MessageId};

/// Messages for a single channel
#[derive(Debug, Clone, Default)]
struct ChannelLog {
    messages: Vec<Message>,
    ids: HashSet<MessageId>,
}

/// Messages grouped by channel, deduplicated by message id
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    channels: HashMap<ChannelId, ChannelLog>,
}

impl MessageLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to its channel
    ///
    /// Returns `false` (and leaves the log untouched) if the channel already
    /// holds a message with the same id.
    pub fn append(&mut self, message: Message) -> bool {
        let channel = self
            .channels
            .entry(message.channel_id.clone())
            .or_default();

        if !channel.ids.insert(message.id.clone()) {
            return false;
        }
        channel.messages.push(message);
        true
    }

    /// Messages of a channel in arrival order (empty for unknown channels)
    pub fn channel(&self, channel_id: &str) -> &[Message] {
        self.channels
            .get(channel_id)
            .map(|c| c.messages.as_slice())
            .unwrap_or(&[])
    }

    /// Whether a channel already holds the given message id
    pub fn contains(&self, channel_id: &str, message_id: &str) -> bool {
        self.channels
            .get(channel_id)
            .map(|c| c.ids.contains(message_id))
            .unwrap_or(false)
    }

    /// Channels with at least one message
    pub fn channel_ids(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.keys()
    }

    /// Number of messages in a channel
    pub fn len(&self, channel_id: &str) -> usize {
        self.channel(channel_id).len()
    }

    /// Total number of messages across channels
    pub fn total(&self) -> usize {
        self.channels.values().map(|c| c.messages.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::Author;

    fn msg(id: &str, channel: &str, content: &str) -> Message {
        Message::new(id, channel, Author::local("ada", "Ada"), content)
    }

    fn ids(log: &MessageLog, channel: &str) -> Vec<String> {
        log.channel(channel).iter().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = MessageLog::new();
        assert!(log.append(msg("m1", "c1", "one")));
        assert!(log.append(msg("m2", "c1", "two")));
        assert!(log.append(msg("m3", "c1", "three")));

        assert_eq!(ids(&log, "c1"), vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_duplicate_is_discarded_not_replaced() {
        let mut log = MessageLog::new();
        assert!(log.append(msg("m1", "c1", "original")));
        assert!(!log.append(msg("m1", "c1", "edited")));

        assert_eq!(log.len("c1"), 1);
        assert_eq!(log.channel("c1")[0].content, "original");
    }

    #[test]
    fn test_first_arrival_order_with_duplicates() {
        let mut log = MessageLog::new();
        for id in ["a", "b", "a", "c", "b", "a", "d"] {
            log.append(msg(id, "c1", id));
        }

        assert_eq!(ids(&log, "c1"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_same_id_in_different_channels() {
        let mut log = MessageLog::new();
        assert!(log.append(msg("m1", "c1", "hi")));
        assert!(log.append(msg("m1", "c2", "hi")));

        assert_eq!(log.len("c1"), 1);
        assert_eq!(log.len("c2"), 1);
        assert_eq!(log.total(), 2);
        assert!(log.contains("c2", "m1"));
        assert!(!log.contains("c3", "m1"));
    }

    #[test]
    fn test_unknown_channel_is_empty() {
        let log = MessageLog::new();
        assert!(log.channel("nowhere").is_empty());
        assert!(log.is_empty());
        assert_eq!(log.channel_ids().count(), 0);
    }
}
