//! Store adapter contract
//!
//! The lock engine never talks to a backend directly. Anything that can run
//! the three conditional operations below atomically per key (a Redis Lua
//! script, an etcd transaction, an in-process map) can back a lock manager.

use std::time::Duration;

use async_trait::async_trait;

/// Atomic conditional operations on a shared key/value store with expiry
///
/// All three operations must be linearizable with respect to each other for
/// the same key. Errors are connectivity/backend failures and are passed
/// through to callers without interpretation.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Set `key` to `token` with expiry `ttl`, only if `key` has no live record
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> anyhow::Result<bool>;

    /// Reset the expiry of `key` to `ttl`, only if its current value is `token`
    async fn extend_if_owner(
        &self,
        key: &str,
        token: &str,
        ttl: Duration,
    ) -> anyhow::Result<bool>;

    /// Remove `key`, only if its current value is `token`
    async fn delete_if_owner(&self, key: &str, token: &str) -> anyhow::Result<bool>;
}
