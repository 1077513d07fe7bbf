// Integration tests for Acquirer and Renewer used directly
// Covers the lower-level building blocks without a LockManager

use std::sync::Arc;
use std::time::Duration;

use holdfast_lock::{Acquirer, LockError, Renewer};
use holdfast_store::MemoryLockStore;

#[tokio::test]
async fn test_acquire_release_round_trip() {
    let store = Arc::new(MemoryLockStore::new());
    let acquirer = Acquirer::new(store.clone(), Duration::from_millis(25));

    for _ in 0..5 {
        let handle = acquirer
            .acquire("jobs", Duration::from_secs(5), Some(Duration::ZERO))
            .await
            .unwrap();
        assert!(acquirer.release(&handle).await.unwrap());
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_renewed_handle_excludes_other_acquirers() {
    let store = Arc::new(MemoryLockStore::new());
    let acquirer = Acquirer::new(store.clone(), Duration::from_millis(25));

    let handle = acquirer
        .acquire("jobs", Duration::from_millis(100), Some(Duration::ZERO))
        .await
        .unwrap();
    let renewer = Renewer::start(store.clone(), &handle, Duration::from_millis(25));

    tokio::time::sleep(Duration::from_millis(300)).await;
    let err = acquirer
        .acquire("jobs", Duration::from_secs(5), Some(Duration::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, LockError::NotAcquired { .. }));

    renewer.stop().await;
    assert!(acquirer.release(&handle).await.unwrap());
    assert!(
        acquirer
            .acquire("jobs", Duration::from_secs(5), Some(Duration::ZERO))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_dropped_renewer_stops_extending() {
    let store = Arc::new(MemoryLockStore::new());
    let acquirer = Acquirer::new(store.clone(), Duration::from_millis(25));

    let handle = acquirer
        .acquire("jobs", Duration::from_millis(80), Some(Duration::ZERO))
        .await
        .unwrap();
    let renewer = Renewer::start(store.clone(), &handle, Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(renewer);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(store.holder("jobs").is_none());
}
