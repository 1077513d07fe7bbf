// In-memory lock store
// Conditional set/extend/delete with per-key atomicity and TTL expiry

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use holdfast_common::LockStore;
use tracing::{debug, info};

/// A stored lease record
#[derive(Debug, Clone)]
pub(crate) struct Record {
    token: String,
    expires_at: Instant,
}

impl Record {
    fn new(token: &str, ttl: Duration) -> Self {
        Self {
            token: token.to_string(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn is_live_for(&self, token: &str) -> bool {
        !self.is_expired() && self.token == token
    }
}

/// In-memory lock store backed by DashMap
///
/// Each conditional operation holds the shard lock for its key for the whole
/// read-check-write, which gives the per-key atomicity the lock engine needs.
/// Expired records are treated as absent; the optional sweeper only reclaims
/// memory.
pub struct MemoryLockStore {
    pub(crate) records: Arc<DashMap<String, Record>>,
    cleanup_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Default for MemoryLockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            cleanup_handle: None,
        }
    }

    /// Start a background task that removes expired records every `interval`
    ///
    /// Must be called from within a tokio runtime. The task stops when the
    /// store is dropped.
    pub fn with_cleanup(mut self, interval: Duration) -> Self {
        let records = self.records.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = Self::sweep(&records);
                if removed > 0 {
                    debug!(count = removed, "Cleaned up expired lock records");
                }
                metrics::gauge!("holdfast_store_live_records").set(records.len() as f64);
            }
        });

        info!(interval_ms = interval.as_millis() as u64, "MemoryLockStore expiry sweeper started");

        self.cleanup_handle = Some(handle);
        self
    }

    fn sweep(records: &DashMap<String, Record>) -> usize {
        let before = records.len();
        records.retain(|_, record| !record.is_expired());
        before.saturating_sub(records.len())
    }

    /// Token of the live record for `key`, if any
    pub fn holder(&self, key: &str) -> Option<String> {
        self.records
            .get(key)
            .filter(|record| !record.is_expired())
            .map(|record| record.token.clone())
    }

    /// Remaining time to live of the record for `key`
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        self.records
            .get(key)
            .filter(|record| !record.is_expired())
            .map(|record| record.expires_at.saturating_duration_since(Instant::now()))
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.records.iter().filter(|r| !r.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for MemoryLockStore {
    fn drop(&mut self) {
        if let Some(handle) = self.cleanup_handle.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> anyhow::Result<bool> {
        let acquired = match self.records.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_expired() {
                    entry.insert(Record::new(token, ttl));
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Record::new(token, ttl));
                true
            }
        };

        if acquired {
            debug!(key = %key, "Lock record set");
        }
        Ok(acquired)
    }

    async fn extend_if_owner(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
    ) -> anyhow::Result<bool> {
        if let Some(mut record) = self.records.get_mut(key)
            && record.is_live_for(token)
        {
            record.expires_at = Instant::now() + ttl;
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete_if_owner(&self, key: &str, token: &str) -> anyhow::Result<bool> {
        // An expired record with a matching token is reclaimed but does not count
        // as a release: nobody held it any more.
        let removed = self
            .records
            .remove_if(key, |_, record| record.token == token)
            .map(|(_, record)| !record.is_expired())
            .unwrap_or(false);

        if removed {
            debug!(key = %key, "Lock record deleted");
        }
        Ok(removed)
    }
}
