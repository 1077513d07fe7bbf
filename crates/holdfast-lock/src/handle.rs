//! Lock handle: evidence of one successful acquisition

use std::time::{Duration, Instant};

use uuid::Uuid;

/// One acquired lease
///
/// The handle is only meaningful while the store record for `key` still holds
/// `owner_token`. Renew and release are conditional on that token, so a stale
/// handle can never touch another owner's lease.
#[derive(Debug, Clone)]
pub struct LockHandle {
    key: String,
    owner_token: String,
    ttl: Duration,
    acquired_at: Instant,
}

impl LockHandle {
    pub(crate) fn new(key: impl Into<String>, owner_token: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            owner_token: owner_token.into(),
            ttl,
            acquired_at: Instant::now(),
        }
    }

    /// Fresh owner token, unique across all acquisitions
    pub(crate) fn generate_token() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn owner_token(&self) -> &str {
        &self.owner_token
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }

    /// Time since acquisition
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}
