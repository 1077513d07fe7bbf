//! Lock manager: configuration state and the `synchronize` session
//!
//! A `LockManager` is built once per process with its store adapter and
//! defaults, started, and then shared (typically behind an `Arc`) by every
//! caller that needs a lock. Sessions never mutate it.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use holdfast_common::{LockError, LockStore, SyncError, namespaced_key};
use tracing::{debug, info, warn};

use crate::acquirer::Acquirer;
use crate::config::LockConfig;
use crate::options::SyncOptions;
use crate::renewer::Renewer;
use crate::session::HeldLock;
use crate::stats::{LockStats, LockStatsCollector};

enum Outcome<T, E> {
    Finished(Result<T, E>),
    LeaseLost,
}

/// Process-wide lock subsystem
pub struct LockManager {
    store: Arc<dyn LockStore>,
    config: LockConfig,
    acquirer: Acquirer,
    started: AtomicBool,
    stats: Arc<LockStatsCollector>,
}

impl LockManager {
    /// Configure a manager over `store`
    ///
    /// The manager starts stopped; call `start()` before the first session.
    pub fn new(store: Arc<dyn LockStore>, config: LockConfig) -> Result<Self, LockError> {
        config.validate()?;
        let acquirer = Acquirer::new(store.clone(), config.poll_interval());

        Ok(Self {
            store,
            config,
            acquirer,
            started: AtomicBool::new(false),
            stats: Arc::new(LockStatsCollector::default()),
        })
    }

    /// Make the subsystem available; idempotent
    pub fn start(&self) {
        if !self.started.swap(true, Ordering::SeqCst) {
            info!(
                key_prefix = %self.config.key_prefix,
                poll_interval_ms = self.config.poll_interval_ms,
                "Lock manager started"
            );
        }
    }

    /// Refuse new sessions; sessions already holding a lock finish normally
    pub fn stop(&self) {
        if self.started.swap(false, Ordering::SeqCst) {
            info!("Lock manager stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn stats(&self) -> LockStats {
        self.stats.snapshot()
    }

    /// Store key used for lock `name`
    pub fn store_key(&self, name: &str) -> String {
        namespaced_key(&self.config.key_prefix, name)
    }

    /// Run `operation` while holding the lock `name`
    ///
    /// When `options` has a false condition, the operation runs immediately
    /// without touching the store. Otherwise the timings are validated, the
    /// lock is acquired (retrying up to the acquire timeout), and a renewer
    /// keeps the lease alive while the operation runs. The lease is released
    /// on every exit path before this returns.
    ///
    /// If the renewer finds the lease gone mid-operation, the operation future
    /// is dropped and `LockError::LeaseLost` is returned: the rest of the
    /// critical section would no longer be exclusive. An operation that
    /// completes after the loss was reported also yields `LeaseLost`, and its
    /// result is discarded.
    pub async fn synchronize<F, Fut, T, E>(
        &self,
        name: &str,
        options: SyncOptions,
        operation: F,
    ) -> Result<T, SyncError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !options.condition() {
            debug!(name = %name, "Lock condition is false, running unlocked");
            self.stats.record_bypassed();
            crate::metrics::record_bypassed();
            return operation().await.map_err(SyncError::Operation);
        }

        let params = options.resolve(&self.config)?;

        if !self.is_started() {
            return Err(LockError::NotStarted.into());
        }

        let key = self.store_key(name);
        let wait_started = Instant::now();

        let handle = match self
            .acquirer
            .acquire(&key, params.ttl, params.acquire_timeout)
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                if e.is_not_acquired() {
                    self.stats.record_acquire_failed();
                    crate::metrics::record_acquire_failed();
                }
                return Err(e.into());
            }
        };

        self.stats.record_acquired();
        crate::metrics::record_acquired(wait_started.elapsed());

        let renewer = Renewer::start(self.store.clone(), &handle, params.extend_interval);
        let mut held = HeldLock::new(self.acquirer.clone(), handle, renewer, self.stats.clone());

        let outcome = {
            let operation = operation();
            tokio::pin!(operation);

            tokio::select! {
                biased;
                result = &mut operation => Outcome::Finished(result),
                _ = held.lease_lost() => Outcome::LeaseLost,
            }
        };

        let key = held.key().to_string();
        let lost = held.release().await;

        match outcome {
            // An operation that never yielded can finish after the renewer
            // already saw the lease go; its section was not exclusive
            Outcome::Finished(result) if !lost => result.map_err(SyncError::Operation),
            Outcome::Finished(_) | Outcome::LeaseLost => {
                warn!(key = %key, "Lease lost during critical section");
                self.stats.record_lease_lost();
                crate::metrics::record_lease_lost();
                Err(LockError::LeaseLost { key }.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::time::Duration;

    use holdfast_store::MemoryLockStore;

    use super::*;

    fn manager(store: Arc<MemoryLockStore>) -> LockManager {
        let config = LockConfig {
            poll_interval_ms: 25,
            ..Default::default()
        };
        let manager = LockManager::new(store, config).unwrap();
        manager.start();
        manager
    }

    #[tokio::test]
    async fn test_returns_operation_result() {
        let store = Arc::new(MemoryLockStore::new());
        let manager = manager(store.clone());

        let result = manager
            .synchronize("test", SyncOptions::new(), || async { Ok::<_, Infallible>(42) })
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert!(store.is_empty());
        assert_eq!(manager.stats().releases, 1);
        assert_eq!(manager.stats().active, 0);
    }

    #[tokio::test]
    async fn test_key_prefix_applied() {
        let store = Arc::new(MemoryLockStore::new());
        let manager = manager(store.clone());

        let holder = manager
            .synchronize("orders", SyncOptions::new(), || async {
                Ok::<_, Infallible>(store.holder("holdfast:orders"))
            })
            .await
            .unwrap();
        assert!(holder.is_some());
    }

    #[tokio::test]
    async fn test_not_started() {
        let store = Arc::new(MemoryLockStore::new());
        let manager = LockManager::new(store, LockConfig::default()).unwrap();

        let err = manager
            .synchronize("test", SyncOptions::new(), || async { Ok::<_, Infallible>(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Lock(LockError::NotStarted)));

        manager.start();
        manager.start();
        assert!(manager.is_started());
        manager.stop();
        assert!(!manager.is_started());
    }

    #[tokio::test]
    async fn test_invalid_options_checked_before_started() {
        let store = Arc::new(MemoryLockStore::new());
        let manager = LockManager::new(store.clone(), LockConfig::default()).unwrap();

        let err = manager
            .synchronize(
                "test",
                SyncOptions::new().ttl_ms(100).extend_interval_ms(100),
                || async { Ok::<_, Infallible>(()) },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Lock(LockError::InvalidParameters(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let store = Arc::new(MemoryLockStore::new());
        let config = LockConfig {
            ttl_ms: 10,
            extend_interval_ms: 20,
            ..Default::default()
        };
        assert!(matches!(
            LockManager::new(store, config),
            Err(LockError::InvalidParameters(_))
        ));
    }

    #[tokio::test]
    async fn test_operation_error_releases_lock() {
        let store = Arc::new(MemoryLockStore::new());
        let manager = manager(store.clone());

        let err = manager
            .synchronize("test", SyncOptions::new(), || async {
                Err::<(), _>(std::io::Error::other("boom"))
            })
            .await
            .unwrap_err();

        match err {
            SyncError::Operation(e) => assert_eq!(e.to_string(), "boom"),
            SyncError::Lock(e) => panic!("unexpected lock error: {e}"),
        }
        assert!(store.is_empty());
    }
}
