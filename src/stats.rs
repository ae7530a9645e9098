//! Per-connection counters (SPEC_FULL §11), grounded in the teacher's
//! `connection_statistics.rs`. Aggregation/export across connections is
//! out of scope; this is just the raw per-connection counter set.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ConnectionStatistics {
    calls_submitted: AtomicU64,
    replies_received: AtomicU64,
    timeouts: AtomicU64,
    aborts: AtomicU64,
    bytes_written: AtomicU64,
    bytes_read: AtomicU64,
}

impl ConnectionStatistics {
    pub(crate) fn record_submit(&self) {
        self.calls_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reply(&self) {
        self.replies_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abort(&self) {
        self.aborts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bytes_written(&self, n: u64) {
        self.bytes_written.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_bytes_read(&self, n: u64) {
        self.bytes_read.fetch_add(n, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> ConnectionStatisticsSnapshot {
        ConnectionStatisticsSnapshot {
            calls_submitted: self.calls_submitted.load(Ordering::Relaxed),
            replies_received: self.replies_received.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            aborts: self.aborts.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStatisticsSnapshot {
    pub calls_submitted: u64,
    pub replies_received: u64,
    pub timeouts: u64,
    pub aborts: u64,
    pub bytes_written: u64,
    pub bytes_read: u64,
}
