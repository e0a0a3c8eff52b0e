use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes every read-modify-write of one checkout record.
///
/// Shared by the checkout service and the callback handler. Guards are
/// released on drop, including when the holding future is cancelled.
#[derive(Clone, Default)]
pub struct CheckoutLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl CheckoutLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, checkout_request_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(checkout_request_id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    /// Drops the lock of a checkout in a terminal state. Terminal records are
    /// never written again, so later callers may safely start a fresh lock.
    pub fn forget(&self, checkout_request_id: &str) {
        self.locks.remove(checkout_request_id);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_id_is_exclusive() {
        let locks = CheckoutLocks::new();
        let guard = locks.acquire("ws_CO_1").await;

        let contended = tokio::time::timeout(Duration::from_millis(20), locks.acquire("ws_CO_1")).await;
        assert!(contended.is_err());
        let other = tokio::time::timeout(Duration::from_millis(20), locks.acquire("ws_CO_2")).await;
        assert!(other.is_ok());

        drop(guard);
        let reacquired = tokio::time::timeout(Duration::from_millis(20), locks.acquire("ws_CO_1")).await;
        assert!(reacquired.is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_holder_releases_lock() {
        let locks = CheckoutLocks::new();
        let holder = {
            let locks = locks.clone();
            async move {
                let _guard = locks.acquire("ws_CO_1").await;
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        };
        assert!(tokio::time::timeout(Duration::from_millis(20), holder).await.is_err());

        let after = tokio::time::timeout(Duration::from_millis(20), locks.acquire("ws_CO_1")).await;
        assert!(after.is_ok());
    }

    #[tokio::test]
    async fn test_forget_removes_entry() {
        let locks = CheckoutLocks::new();
        drop(locks.acquire("ws_CO_1").await);
        assert_eq!(locks.len(), 1);
        locks.forget("ws_CO_1");
        assert!(locks.is_empty());
    }
}
