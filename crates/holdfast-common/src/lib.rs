//! Holdfast Common - Shared types for the lease lock engine
//!
//! This crate provides:
//! - Error types (`LockError`, `SyncError`)
//! - The `LockStore` adapter contract
//! - Common constants

pub mod error;
pub mod traits;

// Re-exports for convenience
pub use error::{LockError, SyncError};
pub use traits::LockStore;

/// Default namespace prepended to every lock key
pub const DEFAULT_KEY_PREFIX: &str = "holdfast";

/// Separator between the key prefix and the lock name
pub const KEY_SEPARATOR: char = ':';

/// Build the store key for a lock name under `prefix`
///
/// An empty prefix leaves the name unchanged.
pub fn namespaced_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", prefix, KEY_SEPARATOR, name)
    }
}
