//! Holdfast Store - lock store adapters
//!
//! `MemoryLockStore` keeps leases in process memory. It is the reference
//! implementation of the `LockStore` contract and the backend used in tests
//! and single-process deployments.

mod memory;

pub use memory::MemoryLockStore;
