//! Store doubles for unit tests: in-memory stores whose reads and writes can
//! be slowed down or made to fail on demand.

use crate::domain::checkout::{CheckoutStatus, PendingCheckout};
use crate::domain::ports::{CheckoutStore, LedgerStore};
use crate::domain::transaction::{NewTransaction, Transaction};
use crate::domain::user::UserId;
use crate::domain::wallet::Wallet;
use crate::error::{PaymentError, Result};
use crate::infrastructure::in_memory::{InMemoryCheckoutStore, InMemoryLedgerStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

async fn pause(millis: &AtomicU64) {
    let millis = millis.load(Ordering::SeqCst);
    if millis > 0 {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

#[derive(Default)]
pub struct ScriptedCheckoutStore {
    pub inner: InMemoryCheckoutStore,
    pub read_delay_ms: AtomicU64,
    /// Delay applied only to writes of `Expired` records.
    pub expired_write_delay_ms: AtomicU64,
    pub fail_writes: AtomicBool,
}

#[async_trait]
impl CheckoutStore for ScriptedCheckoutStore {
    async fn store(&self, checkout: PendingCheckout) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PaymentError::Storage("checkout store unavailable".to_string()));
        }
        if checkout.status == CheckoutStatus::Expired {
            pause(&self.expired_write_delay_ms).await;
        }
        self.inner.store(checkout).await
    }

    async fn get(&self, checkout_request_id: &str) -> Result<Option<PendingCheckout>> {
        pause(&self.read_delay_ms).await;
        self.inner.get(checkout_request_id).await
    }
}

#[derive(Default)]
pub struct ScriptedLedgerStore {
    pub inner: InMemoryLedgerStore,
    pub fail_appends: AtomicBool,
}

#[async_trait]
impl LedgerStore for ScriptedLedgerStore {
    async fn get_or_create_wallet(&self, user_id: UserId) -> Result<Wallet> {
        self.inner.get_or_create_wallet(user_id).await
    }

    async fn find_wallet(&self, user_id: UserId) -> Result<Option<Wallet>> {
        self.inner.find_wallet(user_id).await
    }

    async fn append_transaction(
        &self,
        user_id: UserId,
        entry: NewTransaction,
    ) -> Result<(Wallet, Transaction)> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(PaymentError::Storage("ledger unavailable".to_string()));
        }
        self.inner.append_transaction(user_id, entry).await
    }

    async fn list_transactions(&self, user_id: UserId, limit: usize) -> Result<Vec<Transaction>> {
        self.inner.list_transactions(user_id, limit).await
    }
}
