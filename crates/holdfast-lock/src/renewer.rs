//! Background lease renewal
//!
//! A `Renewer` is spawned for one held lease and owned by the session that
//! acquired it. Every `extend_interval` it re-applies the full TTL, but only if
//! the store still holds this session's owner token. Once the token is gone
//! the renewer stops and reports the loss; it never re-acquires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use holdfast_common::LockStore;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::handle::LockHandle;

/// Periodic extension task for one held lease
pub struct Renewer {
    key: String,
    stop_tx: Option<oneshot::Sender<()>>,
    lost_rx: watch::Receiver<bool>,
    task: Option<JoinHandle<()>>,
}

impl Renewer {
    /// Spawn the renewal task for `handle` on the current tokio runtime
    pub fn start(store: Arc<dyn LockStore>, handle: &LockHandle, extend_interval: Duration) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let (lost_tx, lost_rx) = watch::channel(false);

        let task = tokio::spawn(run(
            store,
            handle.key().to_string(),
            handle.owner_token().to_string(),
            handle.ttl(),
            handle.acquired_at(),
            extend_interval,
            stop_rx,
            lost_tx,
        ));

        Self {
            key: handle.key().to_string(),
            stop_tx: Some(stop_tx),
            lost_rx,
            task: Some(task),
        }
    }

    /// Whether the lease has been reported lost
    pub fn is_lost(&self) -> bool {
        *self.lost_rx.borrow()
    }

    /// Resolve once the lease is lost
    ///
    /// Also resolves if the renewal task died without being stopped, since the
    /// lease is no longer being kept alive in that case.
    pub async fn lost(&mut self) {
        let _ = self.lost_rx.wait_for(|lost| *lost).await;
    }

    /// Stop renewing and wait for the task to finish
    ///
    /// An extension already in flight completes before this returns, so no
    /// renewal can land after the caller goes on to release the lease.
    /// Returns whether the lease was reported lost at any point.
    pub async fn stop(mut self) -> bool {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
            && e.is_panic()
        {
            error!(key = %self.key, "Lease renewal task panicked: {}", e);
        }
        self.is_lost()
    }
}

impl Drop for Renewer {
    fn drop(&mut self) {
        // Only reached without `stop()` when the owning session was cancelled
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    store: Arc<dyn LockStore>,
    key: String,
    token: String,
    ttl: Duration,
    acquired_at: Instant,
    extend_interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
    lost_tx: watch::Sender<bool>,
) {
    // Start of the last call that successfully applied the ttl
    let mut last_extended = acquired_at;

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = tokio::time::sleep(extend_interval) => {}
        }

        let attempted_at = Instant::now();
        match store.extend_if_owner(&key, &token, ttl).await {
            Ok(true) => {
                last_extended = attempted_at;
                trace!(key = %key, "Lease extended");
            }
            Ok(false) => {
                warn!(key = %key, "Lease lost: owner token no longer matches");
                let _ = lost_tx.send(true);
                break;
            }
            // A transient store failure is tolerated while the last successful
            // extension still covers us
            Err(e) if last_extended.elapsed() < ttl => {
                warn!(key = %key, "Lease extension failed, will retry: {}", e);
            }
            Err(e) => {
                error!(key = %key, "Lease extension failed past ttl, lease lost: {}", e);
                let _ = lost_tx.send(true);
                break;
            }
        }

        if extend_interval.is_zero() {
            tokio::task::yield_now().await;
        }
    }

    debug!(key = %key, "Lease renewal stopped");
}
