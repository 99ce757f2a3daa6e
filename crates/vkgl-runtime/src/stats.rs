//! Per-context counters for submissions, replay, state traffic, framebuffer caching and
//! transfer volume. Exposed through [`crate::Device::stats`] as a plain snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of [`ContextStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContextStatsSnapshot {
    pub submissions: u64,
    pub instructions_replayed: u64,
    pub state_changes_issued: u64,
    pub state_changes_elided: u64,
    pub framebuffer_cache_hits: u64,
    pub framebuffer_cache_misses: u64,
    pub framebuffers_created: u64,
    pub bytes_uploaded: u64,
    pub bytes_downloaded: u64,
    pub driver_errors: u64,
}

/// Counters for one context. Updated under the context lock, readable from any thread.
#[derive(Debug, Default)]
pub struct ContextStats {
    submissions: AtomicU64,
    instructions_replayed: AtomicU64,
    state_changes_issued: AtomicU64,
    state_changes_elided: AtomicU64,
    framebuffer_cache_hits: AtomicU64,
    framebuffer_cache_misses: AtomicU64,
    framebuffers_created: AtomicU64,
    bytes_uploaded: AtomicU64,
    bytes_downloaded: AtomicU64,
    driver_errors: AtomicU64,
}

impl ContextStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_submissions(&self) {
        self.submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_instructions_replayed(&self, n: u64) {
        self.instructions_replayed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_state_changes_issued(&self) {
        self.state_changes_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_state_changes_elided(&self) {
        self.state_changes_elided.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_framebuffer_cache_hits(&self) {
        self.framebuffer_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_framebuffer_cache_misses(&self) {
        self.framebuffer_cache_misses
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_framebuffers_created(&self) {
        self.framebuffers_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes_uploaded(&self, n: u64) {
        self.bytes_uploaded.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_bytes_downloaded(&self, n: u64) {
        self.bytes_downloaded.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_driver_errors(&self) {
        self.driver_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ContextStatsSnapshot {
        ContextStatsSnapshot {
            submissions: self.submissions.load(Ordering::Relaxed),
            instructions_replayed: self.instructions_replayed.load(Ordering::Relaxed),
            state_changes_issued: self.state_changes_issued.load(Ordering::Relaxed),
            state_changes_elided: self.state_changes_elided.load(Ordering::Relaxed),
            framebuffer_cache_hits: self.framebuffer_cache_hits.load(Ordering::Relaxed),
            framebuffer_cache_misses: self.framebuffer_cache_misses.load(Ordering::Relaxed),
            framebuffers_created: self.framebuffers_created.load(Ordering::Relaxed),
            bytes_uploaded: self.bytes_uploaded.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            driver_errors: self.driver_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let stats = ContextStats::new();
        stats.inc_submissions();
        stats.add_instructions_replayed(5);
        stats.inc_state_changes_elided();
        stats.add_bytes_uploaded(64);

        let snap = stats.snapshot();
        assert_eq!(snap.submissions, 1);
        assert_eq!(snap.instructions_replayed, 5);
        assert_eq!(snap.state_changes_elided, 1);
        assert_eq!(snap.state_changes_issued, 0);
        assert_eq!(snap.bytes_uploaded, 64);
    }
}
