//! Pipeline metrics
//!
//! Atomic counters for the ingestion loop.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every sub-stream of the pipeline
///
/// Each message ends in exactly one of `upserted`, `deleted`, `skipped` or
/// `dropped`, so those four always sum to `received` once a message is done.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Messages pulled from a change stream
    received: AtomicU64,

    /// Rows inserted or overwritten in the replica
    upserted: AtomicU64,

    /// Delete events applied (including deletes of absent rows)
    deleted: AtomicU64,

    /// Messages without a payload (tombstones, empty bodies)
    skipped: AtomicU64,

    /// Messages that failed to decode or to write
    dropped: AtomicU64,
}

impl PipelineMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            upserted: AtomicU64::new(0),
            deleted: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_upserted(&self) {
        self.upserted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_deleted(&self) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    #[inline]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            upserted: self.upserted.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.received.store(0, Ordering::Relaxed);
        self.upserted.store(0, Ordering::Relaxed);
        self.deleted.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time snapshot of pipeline metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub received: u64,
    pub upserted: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub dropped: u64,
}

impl MetricsSnapshot {
    /// Messages that reached a terminal outcome
    #[inline]
    pub fn completed(&self) -> u64 {
        self.upserted + self.deleted + self.skipped + self.dropped
    }

    /// Fraction of received messages that were dropped
    ///
    /// Returns None if nothing has been received.
    #[inline]
    pub fn drop_rate(&self) -> Option<f64> {
        if self.received == 0 {
            None
        } else {
            Some(self.dropped as f64 / self.received as f64)
        }
    }

    /// Difference from an earlier snapshot
    #[inline]
    pub fn diff(&self, previous: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            received: self.received.saturating_sub(previous.received),
            upserted: self.upserted.saturating_sub(previous.upserted),
            deleted: self.deleted.saturating_sub(previous.deleted),
            skipped: self.skipped.saturating_sub(previous.skipped),
            dropped: self.dropped.saturating_sub(previous.dropped),
        }
    }
}
