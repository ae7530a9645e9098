//! In-flight call id → pending response, with expiry tracking (spec §4.F).

use crate::response::Callback;
use dashmap::DashMap;
use std::time::Instant;

/// The record kept for an in-flight call until its terminal transition.
pub struct PendingEntry {
    pub call_id: u64,
    pub procedure: String,
    pub submitted_at: Instant,
    /// `None` means no timeout was requested for this call.
    pub deadline: Option<Instant>,
    pub callback: Callback,
}

/// A concurrent map from call id to pending entry.
///
/// Backed by [`DashMap`], a sharded hash map: this gives the "sharded map
/// keyed by id hash" §4.F recommends for free, and its `remove` is already
/// atomic per key, which is exactly the race-free `begin_remove` contract
/// §4.F requires — two callers racing `remove(id)` can never both observe
/// `Some`.
pub struct ExecutionCache {
    map: DashMap<u64, PendingEntry>,
}

impl ExecutionCache {
    #[must_use]
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }

    pub fn insert(&self, entry: PendingEntry) {
        self.map.insert(entry.call_id, entry);
    }

    /// Removes and returns the entry for `id`, or `None` if some other
    /// terminal path already claimed it.
    pub fn begin_remove(&self, id: u64) -> Option<PendingEntry> {
        self.map.remove(&id).map(|(_, entry)| entry)
    }

    /// Ids whose deadline has passed as of `now`. Does not remove them.
    #[must_use]
    pub fn expired_ids(&self, now: Instant) -> Vec<u64> {
        self.map
            .iter()
            .filter(|entry| matches!(entry.deadline, Some(deadline) if deadline <= now))
            .map(|entry| *entry.key())
            .collect()
    }

    /// Snapshot of all ids currently pending, used during shutdown.
    #[must_use]
    pub fn current_ids(&self) -> Vec<u64> {
        self.map.iter().map(|entry| *entry.key()).collect()
    }

    /// Whether `id` is still awaiting a terminal transition.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.map.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for ExecutionCache {
    fn default() -> Self {
        Self::new()
    }
}
