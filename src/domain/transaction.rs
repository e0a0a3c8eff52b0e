use crate::domain::user::UserId;
use crate::domain::wallet::{Amount, Balance};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

/// An immutable ledger record. Every balance change produces exactly one.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Transaction {
    pub id: u64,
    /// Owner of the wallet this transaction belongs to.
    pub user_id: UserId,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// The amount with its ledger sign: credits positive, debits negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Credit => self.amount.value(),
            TransactionType::Debit => -self.amount.value(),
        }
    }
}

/// A balance change waiting to be appended to a wallet.
#[derive(Debug, PartialEq, Clone)]
pub struct NewTransaction {
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub description: String,
    /// When set, the store only applies the change if the wallet still holds
    /// this balance, failing with `BalanceConflict` otherwise.
    pub expected_balance: Option<Balance>,
}

impl NewTransaction {
    pub fn credit(amount: Amount, description: impl Into<String>) -> Self {
        Self {
            amount,
            transaction_type: TransactionType::Credit,
            description: description.into(),
            expected_balance: None,
        }
    }

    pub fn debit(amount: Amount, description: impl Into<String>) -> Self {
        Self {
            amount,
            transaction_type: TransactionType::Debit,
            description: description.into(),
            expected_balance: None,
        }
    }

    pub fn expecting(mut self, balance: Balance) -> Self {
        self.expected_balance = Some(balance);
        self
    }
}
