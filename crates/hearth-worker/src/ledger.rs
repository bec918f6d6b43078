//! Retry bookkeeping for transient email failures.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use hearth_core::types::NotificationId;

/// Attempts so far and the earliest time of the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryEntry {
    /// Transient failures recorded
    pub attempts: u32,
    /// Not retried before this instant
    pub retry_after: Instant,
}

/// Per-notification retry state, owned by one worker
#[derive(Debug, Default)]
pub struct RetryLedger {
    entries: HashMap<NotificationId, RetryEntry>,
}

impl RetryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` must wait before its next attempt
    pub fn is_deferred(&self, id: NotificationId, now: Instant) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| entry.retry_after > now)
    }

    /// Record a transient failure and return the attempt count so far
    pub fn record_failure(&mut self, id: NotificationId, now: Instant, backoff: Duration) -> u32 {
        let entry = self.entries.entry(id).or_insert(RetryEntry {
            attempts: 0,
            retry_after: now,
        });
        entry.attempts += 1;
        entry.retry_after = now + backoff;
        entry.attempts
    }

    /// Forget `id`
    pub fn clear(&mut self, id: NotificationId) {
        self.entries.remove(&id);
    }

    /// Drop entries whose retry time passed more than `horizon` ago and
    /// that `keep` does not claim; their rows have been handled elsewhere
    pub fn prune(
        &mut self,
        now: Instant,
        horizon: Duration,
        keep: impl Fn(NotificationId) -> bool,
    ) {
        self.entries
            .retain(|id, entry| entry.retry_after + horizon > now || keep(*id));
    }

    /// Current entry for `id`
    pub fn get(&self, id: NotificationId) -> Option<RetryEntry> {
        self.entries.get(&id).copied()
    }

    /// Number of tracked notifications
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
