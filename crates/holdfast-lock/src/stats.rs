//! Session statistics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Snapshot of a lock manager's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStats {
    /// Successful acquisitions
    pub acquisitions: u64,
    /// Acquisitions that timed out
    pub failed_acquisitions: u64,
    /// Leases released by their owner
    pub releases: u64,
    /// Leases found gone at release time (expired or taken over)
    pub stale_releases: u64,
    /// Critical sections aborted because the lease was lost
    pub leases_lost: u64,
    /// Sessions that ran without locking because their condition was false
    pub bypassed: u64,
    /// Sessions currently holding a lease
    pub active: u64,
    /// Average hold time of completed sessions in milliseconds
    pub avg_hold_time_ms: u64,
}

#[derive(Default)]
pub(crate) struct LockStatsCollector {
    acquisitions: AtomicU64,
    failed_acquisitions: AtomicU64,
    releases: AtomicU64,
    stale_releases: AtomicU64,
    leases_lost: AtomicU64,
    bypassed: AtomicU64,
    active: AtomicU64,
    total_hold_time_ms: AtomicU64,
    completed_holds: AtomicU64,
}

impl LockStatsCollector {
    pub fn record_acquired(&self) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_acquire_failed(&self) {
        self.failed_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_released(&self, released: bool, held: Duration) {
        if released {
            self.releases.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stale_releases.fetch_add(1, Ordering::Relaxed);
        }
        self.total_hold_time_ms
            .fetch_add(held.as_millis() as u64, Ordering::Relaxed);
        self.completed_holds.fetch_add(1, Ordering::Relaxed);
    }

    /// The session no longer holds (or believes it holds) a lease
    pub fn record_session_end(&self) {
        let _ = self
            .active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn record_lease_lost(&self) {
        self.leases_lost.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bypassed(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LockStats {
        let completed = self.completed_holds.load(Ordering::Relaxed);
        let total_hold = self.total_hold_time_ms.load(Ordering::Relaxed);
        let avg_hold = if completed > 0 {
            total_hold / completed
        } else {
            0
        };

        LockStats {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            failed_acquisitions: self.failed_acquisitions.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            stale_releases: self.stale_releases.load(Ordering::Relaxed),
            leases_lost: self.leases_lost.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
            avg_hold_time_ms: avg_hold,
        }
    }
}
