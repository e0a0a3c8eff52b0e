use crate::domain::ports::LedgerStoreRef;
use crate::domain::transaction::{NewTransaction, Transaction};
use crate::domain::user::UserId;
use crate::domain::wallet::{Amount, Balance};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

/// Balance a wallet must hold before any withdrawal is accepted.
pub const MINIMUM_WITHDRAWAL_BALANCE: Decimal = dec!(2000);
/// Cap on the transaction history returned to clients.
pub const RECENT_TRANSACTIONS_LIMIT: usize = 20;
pub const WITHDRAWAL_DESCRIPTION: &str = "Withdrawal request";

const MAX_WITHDRAWAL_ATTEMPTS: usize = 3;

/// Balance reads, history and withdrawals on top of the ledger store.
#[derive(Clone)]
pub struct WalletService {
    ledger: LedgerStoreRef,
}

impl WalletService {
    pub fn new(ledger: LedgerStoreRef) -> Self {
        Self { ledger }
    }

    /// Current balance; a missing wallet is created with a zero balance.
    pub async fn get_balance(&self, user_id: UserId) -> Result<Balance> {
        Ok(self.ledger.get_or_create_wallet(user_id).await?.balance)
    }

    /// Newest-first history, capped at [`RECENT_TRANSACTIONS_LIMIT`].
    pub async fn list_recent(&self, user_id: UserId, limit: usize) -> Result<Vec<Transaction>> {
        self.ledger.get_or_create_wallet(user_id).await?;
        self.ledger
            .list_transactions(user_id, limit.min(RECENT_TRANSACTIONS_LIMIT))
            .await
    }

    /// Debits a withdrawal and returns the new balance.
    ///
    /// `None` (or zero) withdraws the whole balance. Unlike balance reads this
    /// never creates a wallet. The balance seen during validation is passed to
    /// the store as the expected value, so a concurrent change forces a fresh
    /// read and re-validation.
    pub async fn request_withdrawal(
        &self,
        user_id: UserId,
        amount: Option<Decimal>,
    ) -> Result<Balance> {
        for attempt in 1..=MAX_WITHDRAWAL_ATTEMPTS {
            let wallet = self
                .ledger
                .find_wallet(user_id)
                .await?
                .ok_or(PaymentError::WalletNotFound)?;

            if wallet.balance.value() < MINIMUM_WITHDRAWAL_BALANCE {
                return Err(PaymentError::BelowMinimumWithdrawal);
            }

            let amount = match amount {
                Some(value) if !value.is_zero() => Amount::new(value)?,
                _ => Amount::new(wallet.balance.value())?,
            };
            if Balance::from(amount) > wallet.balance {
                return Err(PaymentError::InsufficientBalance);
            }

            let entry = NewTransaction::debit(amount, WITHDRAWAL_DESCRIPTION).expecting(wallet.balance);
            match self.ledger.append_transaction(user_id, entry).await {
                Ok((wallet, tx)) => {
                    info!(
                        user_id,
                        transaction_id = tx.id,
                        amount = %amount,
                        new_balance = %wallet.balance,
                        "withdrawal recorded"
                    );
                    return Ok(wallet.balance);
                }
                Err(PaymentError::BalanceConflict) => {
                    debug!(user_id, attempt, "wallet changed during withdrawal, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(PaymentError::BalanceConflict)
    }

    pub async fn credit(
        &self,
        user_id: UserId,
        amount: Amount,
        description: impl Into<String>,
    ) -> Result<Transaction> {
        let (wallet, tx) = self
            .ledger
            .append_transaction(user_id, NewTransaction::credit(amount, description))
            .await?;
        info!(
            user_id,
            transaction_id = tx.id,
            amount = %amount,
            new_balance = %wallet.balance,
            "wallet credited"
        );
        Ok(tx)
    }
}
