//! Shared health state for the /health endpoint.
//! Updated by the YouTube client, NicheRefresher and SnapshotWriter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared health counters. Updated by service components, read by API.
#[derive(Default)]
pub struct HealthState {
    /// Nanosecond timestamp of the last successful background refresh (0 = none).
    last_refresh_at_ns: AtomicU64,
    /// YouTube requests issued, retries included.
    youtube_requests: AtomicU64,
    /// YouTube calls that failed after all attempts.
    youtube_errors: AtomicU64,
    /// Research snapshots persisted to SQLite.
    snapshots_written: AtomicU64,
    /// Approximate count of snapshots queued for DB write.
    write_queue_pending: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_last_refresh_at_ns(&self, ns: u64) {
        self.last_refresh_at_ns.store(ns, Ordering::Relaxed);
    }

    pub fn inc_youtube_requests(&self) {
        self.youtube_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_youtube_errors(&self) {
        self.youtube_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_snapshots_written(&self) {
        self.snapshots_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_write_queue_pending(&self) {
        self.write_queue_pending.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_write_queue_pending(&self) {
        // Never wrap below zero if a decrement races ahead of its increment.
        let _ = self
            .write_queue_pending
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }

    pub fn last_refresh_at_ns(&self) -> u64 {
        self.last_refresh_at_ns.load(Ordering::Relaxed)
    }

    pub fn youtube_requests(&self) -> u64 {
        self.youtube_requests.load(Ordering::Relaxed)
    }

    pub fn youtube_errors(&self) -> u64 {
        self.youtube_errors.load(Ordering::Relaxed)
    }

    pub fn snapshots_written(&self) -> u64 {
        self.snapshots_written.load(Ordering::Relaxed)
    }

    pub fn write_queue_pending(&self) -> u64 {
        self.write_queue_pending.load(Ordering::Relaxed)
    }
}
