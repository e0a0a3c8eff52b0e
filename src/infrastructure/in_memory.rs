use crate::domain::checkout::PendingCheckout;
use crate::domain::ports::{CheckoutStore, LedgerStore, UserStore};
use crate::domain::transaction::{NewTransaction, Transaction, TransactionType};
use crate::domain::user::{User, UserId};
use crate::domain::wallet::Wallet;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};

#[derive(Debug)]
struct WalletRecord {
    wallet: Wallet,
    transactions: Vec<Transaction>,
}

impl WalletRecord {
    fn new(user_id: UserId) -> Self {
        Self {
            wallet: Wallet::new(user_id),
            transactions: Vec::new(),
        }
    }
}

/// A thread-safe in-memory ledger.
///
/// Each wallet sits behind its own `Mutex`, so mutations are serialized per
/// wallet while different wallets proceed in parallel.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    wallets: Arc<DashMap<UserId, Arc<Mutex<WalletRecord>>>>,
    last_tx_id: Arc<AtomicU64>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, user_id: UserId) -> Arc<Mutex<WalletRecord>> {
        self.wallets
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(WalletRecord::new(user_id))))
            .clone()
    }

    fn existing_slot(&self, user_id: UserId) -> Option<Arc<Mutex<WalletRecord>>> {
        self.wallets.get(&user_id).map(|entry| Arc::clone(entry.value()))
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get_or_create_wallet(&self, user_id: UserId) -> Result<Wallet> {
        let slot = self.slot(user_id);
        let record = slot.lock().await;
        Ok(record.wallet.clone())
    }

    async fn find_wallet(&self, user_id: UserId) -> Result<Option<Wallet>> {
        match self.existing_slot(user_id) {
            Some(slot) => Ok(Some(slot.lock().await.wallet.clone())),
            None => Ok(None),
        }
    }

    async fn append_transaction(
        &self,
        user_id: UserId,
        entry: NewTransaction,
    ) -> Result<(Wallet, Transaction)> {
        let slot = self.slot(user_id);
        let mut record = slot.lock().await;

        if let Some(expected) = entry.expected_balance
            && record.wallet.balance != expected
        {
            return Err(PaymentError::BalanceConflict);
        }

        let mut wallet = record.wallet.clone();
        match entry.transaction_type {
            TransactionType::Credit => wallet.credit(entry.amount),
            TransactionType::Debit => wallet.debit(entry.amount)?,
        }

        let tx = Transaction {
            id: self.last_tx_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id,
            amount: entry.amount,
            transaction_type: entry.transaction_type,
            description: entry.description,
            created_at: Utc::now(),
        };

        record.wallet = wallet.clone();
        record.transactions.push(tx.clone());
        Ok((wallet, tx))
    }

    async fn list_transactions(&self, user_id: UserId, limit: usize) -> Result<Vec<Transaction>> {
        let Some(slot) = self.existing_slot(user_id) else {
            return Ok(Vec::new());
        };
        let record = slot.lock().await;
        Ok(record
            .transactions
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

/// A thread-safe in-memory store for user accounts.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn store(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.auth_token == token).cloned())
    }
}

/// A thread-safe in-memory store for pending checkouts.
#[derive(Default, Clone)]
pub struct InMemoryCheckoutStore {
    checkouts: Arc<RwLock<HashMap<String, PendingCheckout>>>,
}

impl InMemoryCheckoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckoutStore for InMemoryCheckoutStore {
    async fn store(&self, checkout: PendingCheckout) -> Result<()> {
        let mut checkouts = self.checkouts.write().await;
        checkouts.insert(checkout.checkout_request_id.clone(), checkout);
        Ok(())
    }

    async fn get(&self, checkout_request_id: &str) -> Result<Option<PendingCheckout>> {
        let checkouts = self.checkouts.read().await;
        Ok(checkouts.get(checkout_request_id).cloned())
    }
}
