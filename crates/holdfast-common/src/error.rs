//! Error types for Holdfast
//!
//! This module defines:
//! - `LockError`: failures of the lock lifecycle itself
//! - `SyncError`: wrapper returned by `synchronize`, carrying either a lock
//!   failure or the protected operation's own error untouched

use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Lock lifecycle errors
#[derive(thiserror::Error, Debug)]
pub enum LockError {
    /// Caller supplied timings that can never form a valid lease
    #[error("invalid lock parameters: {0}")]
    InvalidParameters(String),

    #[error("lock '{key}' not acquired within {waited:?}")]
    NotAcquired { key: String, waited: Duration },

    /// The renewer found another owner (or no owner) while the block was running
    #[error("lease on '{key}' was lost while the critical section was running")]
    LeaseLost { key: String },

    #[error("lock manager is not started")]
    NotStarted,

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl LockError {
    pub fn invalid(message: impl Into<String>) -> Self {
        LockError::InvalidParameters(message.into())
    }

    pub fn is_not_acquired(&self) -> bool {
        matches!(self, LockError::NotAcquired { .. })
    }

    pub fn is_lease_lost(&self) -> bool {
        matches!(self, LockError::LeaseLost { .. })
    }
}

/// Error type for `synchronize`
#[derive(Debug)]
pub enum SyncError<E> {
    /// Locking failed, or the lease was lost mid-operation
    Lock(LockError),
    /// The protected operation failed; the lock was released before returning
    Operation(E),
}

impl<E> SyncError<E> {
    pub fn lock_error(&self) -> Option<&LockError> {
        match self {
            SyncError::Lock(e) => Some(e),
            SyncError::Operation(_) => None,
        }
    }

    pub fn into_operation(self) -> Option<E> {
        match self {
            SyncError::Lock(_) => None,
            SyncError::Operation(e) => Some(e),
        }
    }
}

impl<E> From<LockError> for SyncError<E> {
    fn from(value: LockError) -> Self {
        SyncError::Lock(value)
    }
}

impl<E: Display> Display for SyncError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Lock(e) => write!(f, "{}", e),
            SyncError::Operation(e) => write!(f, "operation failed: {}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for SyncError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Lock(e) => Some(e),
            SyncError::Operation(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_error_display() {
        let err = LockError::NotAcquired {
            key: "holdfast:orders".to_string(),
            waited: Duration::from_millis(0),
        };
        assert_eq!(
            err.to_string(),
            "lock 'holdfast:orders' not acquired within 0ns"
        );
        assert!(err.is_not_acquired());
        assert!(!err.is_lease_lost());

        let err = LockError::invalid("ttl must be greater than extend_interval");
        assert_eq!(
            err.to_string(),
            "invalid lock parameters: ttl must be greater than extend_interval"
        );
    }

    #[test]
    fn test_store_error_from_anyhow() {
        let err: LockError = anyhow::anyhow!("connection reset").into();
        assert!(matches!(err, LockError::Store(_)));
        assert_eq!(err.to_string(), "store error: connection reset");
    }

    #[test]
    fn test_sync_error_accessors() {
        let err: SyncError<std::io::Error> = LockError::NotStarted.into();
        assert!(matches!(err.lock_error(), Some(LockError::NotStarted)));
        assert!(err.into_operation().is_none());

        let err: SyncError<std::io::Error> =
            SyncError::Operation(std::io::Error::other("disk full"));
        assert!(err.lock_error().is_none());
        assert_eq!(err.to_string(), "operation failed: disk full");
        assert_eq!(err.into_operation().map(|e| e.to_string()).as_deref(), Some("disk full"));
    }
}
