use crate::domain::checkout::PendingCheckout;
use crate::domain::ports::{CheckoutStore, LedgerStore, UserStore};
use crate::domain::transaction::{NewTransaction, Transaction, TransactionType};
use crate::domain::user::{User, UserId};
use crate::domain::wallet::Wallet;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column Family for wallet balances, keyed by user id.
pub const CF_WALLETS: &str = "wallets";
/// Column Family for ledger transactions, keyed by user id then transaction id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for user accounts.
pub const CF_USERS: &str = "users";
/// Column Family for pending checkouts, keyed by checkout request id.
pub const CF_CHECKOUTS: &str = "checkouts";

fn tx_key(user_id: UserId, tx_id: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&user_id.to_be_bytes());
    key[8..].copy_from_slice(&tx_id.to_be_bytes());
    key
}

/// A persistent store implementing every storage port on one RocksDB instance.
///
/// A wallet update and its transaction are committed in a single `WriteBatch`
/// while that wallet's lock is held, so readers never see one without the other.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    wallet_locks: Arc<DashMap<UserId, Arc<Mutex<()>>>>,
    last_tx_id: Arc<AtomicU64>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures the column families exist and recovers the transaction id
    /// sequence from the stored history.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_WALLETS, CF_TRANSACTIONS, CF_USERS, CF_CHECKOUTS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, families)?;

        let store = Self {
            db: Arc::new(db),
            wallet_locks: Arc::new(DashMap::new()),
            last_tx_id: Arc::new(AtomicU64::new(0)),
        };
        let last = store.max_transaction_id()?;
        store.last_tx_id.store(last, Ordering::SeqCst);
        Ok(store)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::Storage(format!("{} column family not found", name)))
    }

    fn get_json<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(self.cf(cf)?, key, bytes)?;
        Ok(())
    }

    fn wallet_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.wallet_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn max_transaction_id(&self) -> Result<u64> {
        let mut max = 0;
        for item in self.db.iterator_cf(self.cf(CF_TRANSACTIONS)?, IteratorMode::Start) {
            let (key, _) = item?;
            if let Some(id_bytes) = key.get(8..16).and_then(|b| <[u8; 8]>::try_from(b).ok()) {
                max = max.max(u64::from_be_bytes(id_bytes));
            }
        }
        Ok(max)
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn get_or_create_wallet(&self, user_id: UserId) -> Result<Wallet> {
        let lock = self.wallet_lock(user_id);
        let _guard = lock.lock().await;

        let key = user_id.to_be_bytes();
        if let Some(wallet) = self.get_json(CF_WALLETS, &key)? {
            return Ok(wallet);
        }
        let wallet = Wallet::new(user_id);
        self.put_json(CF_WALLETS, &key, &wallet)?;
        Ok(wallet)
    }

    async fn find_wallet(&self, user_id: UserId) -> Result<Option<Wallet>> {
        self.get_json(CF_WALLETS, &user_id.to_be_bytes())
    }

    async fn append_transaction(
        &self,
        user_id: UserId,
        entry: NewTransaction,
    ) -> Result<(Wallet, Transaction)> {
        let lock = self.wallet_lock(user_id);
        let _guard = lock.lock().await;

        let key = user_id.to_be_bytes();
        let mut wallet = self
            .get_json(CF_WALLETS, &key)?
            .unwrap_or_else(|| Wallet::new(user_id));

        if let Some(expected) = entry.expected_balance
            && wallet.balance != expected
        {
            return Err(PaymentError::BalanceConflict);
        }

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

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_WALLETS)?, key, serde_json::to_vec(&wallet)?);
        batch.put_cf(
            self.cf(CF_TRANSACTIONS)?,
            tx_key(user_id, tx.id),
            serde_json::to_vec(&tx)?,
        );
        self.db.write(batch)?;

        Ok((wallet, tx))
    }

    async fn list_transactions(&self, user_id: UserId, limit: usize) -> Result<Vec<Transaction>> {
        let prefix = user_id.to_be_bytes();
        let start = tx_key(user_id, u64::MAX);
        let iter = self.db.iterator_cf(
            self.cf(CF_TRANSACTIONS)?,
            IteratorMode::From(&start, Direction::Reverse),
        );

        let mut transactions = Vec::new();
        for item in iter {
            if transactions.len() >= limit {
                break;
            }
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            transactions.push(serde_json::from_slice(&value)?);
        }
        Ok(transactions)
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn store(&self, user: User) -> Result<()> {
        self.put_json(CF_USERS, &user.id.to_be_bytes(), &user)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>> {
        self.get_json(CF_USERS, &user_id.to_be_bytes())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>> {
        for item in self.db.iterator_cf(self.cf(CF_USERS)?, IteratorMode::Start) {
            let (_key, value) = item?;
            let user: User = serde_json::from_slice(&value)?;
            if user.auth_token == token {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl CheckoutStore for RocksDBStore {
    async fn store(&self, checkout: PendingCheckout) -> Result<()> {
        self.put_json(
            CF_CHECKOUTS,
            checkout.checkout_request_id.as_bytes(),
            &checkout,
        )
    }

    async fn get(&self, checkout_request_id: &str) -> Result<Option<PendingCheckout>> {
        self.get_json(CF_CHECKOUTS, checkout_request_id.as_bytes())
    }
}
