//! Bounded conversation history.

use parley_core::message::Message;
use std::collections::VecDeque;

/// Chronological message log with a fixed capacity.
///
/// Pushing onto a full log evicts the oldest entry first, so the log only
/// ever holds the most recent `capacity` messages.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    entries: VecDeque<Message>,
    capacity: usize,
}

impl ConversationLog {
    /// Create an empty log. A zero capacity is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, message: Message) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.back()
    }

    /// The trailing `n` entries (or all of them, if fewer), oldest first.
    pub fn last_n(&self, n: usize) -> impl Iterator<Item = &Message> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::with_capacity(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::message::Role;

    #[test]
    fn evicts_oldest_first() {
        let mut log = ConversationLog::with_capacity(3);
        for i in 1..=5 {
            log.push(Message::user(i.to_string()));
        }
        assert_eq!(log.len(), 3);
        let contents: Vec<_> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["3", "4", "5"]);
    }

    #[test]
    fn last_n_is_trailing_window() {
        let mut log = ConversationLog::default();
        log.push(Message::user("a"));
        log.push(Message::assistant("b"));
        log.push(Message::user("c"));

        let tail: Vec<_> = log.last_n(2).map(|m| m.content.as_str()).collect();
        assert_eq!(tail, vec!["b", "c"]);
        assert_eq!(log.last_n(10).count(), 3);
        assert_eq!(log.last_n(0).count(), 0);
    }

    #[test]
    fn accessors() {
        let mut log = ConversationLog::with_capacity(0);
        assert!(log.is_empty());
        assert_eq!(log.capacity(), 1);

        log.push(Message::user("first"));
        log.push(Message::assistant("second"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(0).unwrap().role, Role::Assistant);
        assert_eq!(log.last().unwrap().content, "second");
    }
}
