//! Holdfast Lock - lease-based distributed mutual exclusion
//!
//! This crate provides:
//! - Bounded-retry acquisition (`Acquirer`)
//! - Background lease renewal (`Renewer`)
//! - The `synchronize` session with guaranteed release (`LockManager`)
//! - Configuration, logging and metrics setup for embedding processes
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use holdfast_lock::{LockConfig, LockManager, SyncOptions};
//! use holdfast_store::MemoryLockStore;
//!
//! let manager = LockManager::new(Arc::new(MemoryLockStore::new()), LockConfig::from_env()?)?;
//! manager.start();
//!
//! let total = manager
//!     .synchronize("nightly-report", SyncOptions::new().ttl_ms(30_000).extend_interval_ms(10_000), || async {
//!         build_report().await
//!     })
//!     .await?;
//! ```

pub mod acquirer;
pub mod config;
pub mod handle;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod options;
pub mod renewer;
mod session;
pub mod stats;

// Re-export commonly used types
pub use acquirer::Acquirer;
pub use config::LockConfig;
pub use handle::LockHandle;
pub use manager::LockManager;
pub use options::{SyncOptions, validate_timings};
pub use renewer::Renewer;
pub use stats::LockStats;

pub use holdfast_common::{LockError, LockStore, SyncError};
