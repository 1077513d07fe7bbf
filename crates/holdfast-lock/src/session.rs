//! Held-lock guard for one session
//!
//! `HeldLock` owns the lease and its renewer between acquisition and release.
//! The normal path calls `release()`. If the session future is dropped first
//! (caller cancelled or timed out the operation), `Drop` aborts the renewer and
//! schedules the release on the current runtime.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::acquirer::Acquirer;
use crate::handle::LockHandle;
use crate::renewer::Renewer;
use crate::stats::LockStatsCollector;

pub(crate) struct HeldLock {
    acquirer: Acquirer,
    handle: LockHandle,
    renewer: Option<Renewer>,
    stats: Arc<LockStatsCollector>,
    released: bool,
}

impl HeldLock {
    pub fn new(
        acquirer: Acquirer,
        handle: LockHandle,
        renewer: Renewer,
        stats: Arc<LockStatsCollector>,
    ) -> Self {
        Self {
            acquirer,
            handle,
            renewer: Some(renewer),
            stats,
            released: false,
        }
    }

    pub fn key(&self) -> &str {
        self.handle.key()
    }

    /// Resolve once the renewer reports the lease lost; pending forever after stop
    pub async fn lease_lost(&mut self) {
        match self.renewer.as_mut() {
            Some(renewer) => renewer.lost().await,
            None => std::future::pending().await,
        }
    }

    /// Stop renewal, then delete the lease if it is still ours
    ///
    /// A lease that already expired or was taken over is a benign no-op. Store
    /// errors are logged and swallowed so they never mask the operation's own
    /// outcome; the lease will lapse after its ttl regardless. Returns whether
    /// the renewer reported the lease lost while it was held.
    pub async fn release(mut self) -> bool {
        let lost = match self.renewer.take() {
            Some(renewer) => renewer.stop().await,
            None => false,
        };

        let held = self.handle.held_for();
        match self.acquirer.release(&self.handle).await {
            Ok(released) => {
                self.stats.record_released(released, held);
                crate::metrics::record_released(released, held);
            }
            Err(e) => {
                warn!(key = %self.handle.key(), "Failed to release lock, it will expire after its ttl: {}", e);
            }
        }

        self.stats.record_session_end();
        self.released = true;
        lost
    }
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        // Aborts the renewal task
        self.renewer.take();
        self.stats.record_session_end();

        let acquirer = self.acquirer.clone();
        let handle = self.handle.clone();
        let key = handle.key().to_string();

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(key = %key, "Session cancelled while holding lock, releasing in background");
                runtime.spawn(async move {
                    if let Err(e) = acquirer.release(&handle).await {
                        warn!(key = %key, "Background release failed, lock will expire after its ttl: {}", e);
                    }
                });
            }
            Err(_) => {
                warn!(key = %key, "No runtime to release cancelled lock, it will expire after its ttl");
            }
        }
    }
}
