//! Bounded recent-message cache
//!
//! Fingerprints are evicted in insertion order (FIFO), not by recency of use.

use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Fingerprint -> message id, bounded by `capacity`
#[derive(Debug)]
pub struct DedupCache {
    capacity: usize,
    entries: HashMap<String, Uuid>,
    order: VecDeque<String>,
}

impl DedupCache {
    /// Create a cache holding at most `capacity` fingerprints (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a fingerprint
    ///
    /// Returns `false` if it is already present; the cache is left untouched.
    /// Otherwise evicts the oldest entry when full and returns `true`.
    pub fn insert(&mut self, fingerprint: String, id: Uuid) -> bool {
        if self.entries.contains_key(&fingerprint) {
            return false;
        }

        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }

        self.order.push_back(fingerprint.clone());
        self.entries.insert(fingerprint, id);
        true
    }

    #[cfg(test)]
    fn contains(&self, fingerprint: &str) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Id of the message first seen with this fingerprint
    #[cfg(test)]
    fn get(&self, fingerprint: &str) -> Option<Uuid> {
        self.entries.get(fingerprint).copied()
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
