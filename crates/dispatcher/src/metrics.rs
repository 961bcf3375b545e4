//! Dispatcher counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single dispatcher instance
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Accepted submissions (duplicates excluded)
    submitted: AtomicU64,
    /// Submissions suppressed by the dedup cache
    duplicates: AtomicU64,
    /// Successful `send_one` calls
    immediate_sends: AtomicU64,
    /// Successful `send_batch` calls
    batches_sent: AtomicU64,
    /// Messages delivered inside batches
    messages_batched: AtomicU64,
    /// Failed `send_one` calls
    send_failures: AtomicU64,
    /// Failed batch flushes
    flush_failures: AtomicU64,
    /// Messages dropped by failed flushes
    messages_lost: AtomicU64,
    /// Submissions rejected for configuration reasons
    configuration_errors: AtomicU64,
}

impl DispatcherMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_duplicates(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_immediate_sends(&self) {
        self.immediate_sends.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one delivered batch of `len` messages
    pub fn record_batch(&self, len: usize) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.messages_batched
            .fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn inc_send_failures(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one failed flush that dropped `lost` messages
    pub fn record_flush_failure(&self, lost: usize) {
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
        self.messages_lost.fetch_add(lost as u64, Ordering::Relaxed);
    }

    pub fn inc_configuration_errors(&self) {
        self.configuration_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            immediate_sends: self.immediate_sends.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            messages_batched: self.messages_batched.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            messages_lost: self.messages_lost.load(Ordering::Relaxed),
            configuration_errors: self.configuration_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub duplicates: u64,
    pub immediate_sends: u64,
    pub batches_sent: u64,
    pub messages_batched: u64,
    pub send_failures: u64,
    pub flush_failures: u64,
    pub messages_lost: u64,
    pub configuration_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = DispatcherMetrics::new();
        metrics.inc_submitted();
        metrics.inc_submitted();
        metrics.inc_duplicates();
        metrics.record_batch(5);
        metrics.record_flush_failure(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.submitted, 2);
        assert_eq!(snapshot.duplicates, 1);
        assert_eq!(snapshot.batches_sent, 1);
        assert_eq!(snapshot.messages_batched, 5);
        assert_eq!(snapshot.flush_failures, 1);
        assert_eq!(snapshot.messages_lost, 3);
        assert_eq!(snapshot.immediate_sends, 0);
    }
}
