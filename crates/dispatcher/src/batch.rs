//! Per-destination batch buffers

use contracts::{DestinationKey, Message};
use std::collections::HashMap;

/// Destination -> pending messages in insertion order
#[derive(Debug, Default)]
pub struct BatchBuffers {
    buffers: HashMap<DestinationKey, Vec<Message>>,
}

impl BatchBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to its destination's buffer, returning the new length
    pub fn push(&mut self, message: Message) -> usize {
        let buffer = self
            .buffers
            .entry(message.destination.clone())
            .or_default();
        buffer.push(message);
        buffer.len()
    }

    /// Take and clear one destination's buffer
    pub fn take(&mut self, destination: &str) -> Vec<Message> {
        self.buffers.remove(destination).unwrap_or_default()
    }

    /// Take and clear every non-empty buffer, ordered by destination name
    pub fn take_all(&mut self) -> Vec<(DestinationKey, Vec<Message>)> {
        let mut batches: Vec<_> = self
            .buffers
            .drain()
            .filter(|(_, messages)| !messages.is_empty())
            .collect();
        batches.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        batches
    }

    pub fn pending(&self, destination: &str) -> usize {
        self.buffers.get(destination).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.buffers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Priority;
    use serde_json::json;

    fn msg(destination: &str, n: u32) -> Message {
        Message::new(destination, "EVENT", json!({ "n": n }), Priority::Medium)
    }

    #[test]
    fn test_push_and_take_preserves_order() {
        let mut buffers = BatchBuffers::new();
        assert_eq!(buffers.push(msg("a", 1)), 1);
        assert_eq!(buffers.push(msg("a", 2)), 2);
        assert_eq!(buffers.push(msg("b", 3)), 1);

        let taken = buffers.take("a");
        let ns: Vec<_> = taken.iter().map(|m| m.payload["n"].clone()).collect();
        assert_eq!(ns, vec![json!(1), json!(2)]);
        assert_eq!(buffers.pending("a"), 0);
        assert_eq!(buffers.pending("b"), 1);
    }

    #[test]
    fn test_take_all_clears() {
        let mut buffers = BatchBuffers::new();
        buffers.push(msg("zeta", 1));
        buffers.push(msg("alpha", 2));
        buffers.push(msg("alpha", 3));

        let batches = buffers.take_all();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].0, "alpha");
        assert_eq!(batches[0].1.len(), 2);
        assert!(buffers.is_empty());
        assert_eq!(buffers.total(), 0);
    }

    #[test]
    fn test_take_missing_is_empty() {
        let mut buffers = BatchBuffers::new();
        assert!(buffers.take("nothing").is_empty());
        assert!(buffers.is_empty());
    }
}
