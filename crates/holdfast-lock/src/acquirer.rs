//! Bounded-retry lock acquisition
//!
//! Polling is a fixed sleep between attempts. Correctness comes from the
//! store's conditional set; the poll interval only bounds how often a waiter
//! hits the store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use holdfast_common::{LockError, LockStore};
use tracing::{debug, trace};

use crate::handle::LockHandle;

/// Acquires and releases leases against a `LockStore`
#[derive(Clone)]
pub struct Acquirer {
    store: Arc<dyn LockStore>,
    poll_interval: Duration,
}

impl Acquirer {
    pub fn new(store: Arc<dyn LockStore>, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Acquire `key` for `ttl`, retrying for up to `timeout`
    ///
    /// `Some(Duration::ZERO)` makes exactly one attempt; `None` retries until
    /// the lock is acquired. Store errors abort the loop immediately.
    pub async fn acquire(
        &self,
        key: &str,
        ttl: Duration,
        timeout: Option<Duration>,
    ) -> Result<LockHandle, LockError> {
        let started = Instant::now();
        let token = LockHandle::generate_token();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            if self.store.set_if_absent(key, &token, ttl).await? {
                debug!(key = %key, attempts, waited_ms = started.elapsed().as_millis() as u64, "Lock acquired");
                return Ok(LockHandle::new(key, token, ttl));
            }

            let elapsed = started.elapsed();
            let pause = match timeout {
                Some(limit) if elapsed >= limit => {
                    debug!(key = %key, attempts, "Lock not acquired before timeout");
                    return Err(LockError::NotAcquired {
                        key: key.to_string(),
                        waited: elapsed,
                    });
                }
                // Never sleep past the deadline; the last attempt lands on it
                Some(limit) => self.poll_interval.min(limit - elapsed),
                None => self.poll_interval,
            };

            trace!(key = %key, attempts, pause_ms = pause.as_millis() as u64, "Lock busy, retrying");
            tokio::time::sleep(pause).await;
        }
    }

    /// Release `handle` if it still owns its key
    ///
    /// Returns `false` when the lease had already expired or been taken over.
    pub async fn release(&self, handle: &LockHandle) -> Result<bool, LockError> {
        let released = self
            .store
            .delete_if_owner(handle.key(), handle.owner_token())
            .await?;
        if released {
            debug!(key = %handle.key(), held_ms = handle.held_for().as_millis() as u64, "Lock released");
        } else {
            debug!(key = %handle.key(), "Lock already expired or taken over, nothing to release");
        }
        Ok(released)
    }
}
