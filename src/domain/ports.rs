use super::checkout::PendingCheckout;
use super::phone::PhoneNumber;
use super::transaction::{NewTransaction, Transaction};
use super::user::{User, UserId};
use super::wallet::Wallet;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable wallets and their append-only transaction history.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Returns the user's wallet, creating a zero-balance one if absent.
    async fn get_or_create_wallet(&self, user_id: UserId) -> Result<Wallet>;

    async fn find_wallet(&self, user_id: UserId) -> Result<Option<Wallet>>;

    /// Applies `entry` to the user's wallet and records it as one atomic unit.
    ///
    /// Mutations of a single wallet are serialized. Fails with
    /// `InsufficientBalance` if a debit would take the balance below zero and
    /// with `BalanceConflict` if `entry.expected_balance` no longer matches.
    async fn append_transaction(
        &self,
        user_id: UserId,
        entry: NewTransaction,
    ) -> Result<(Wallet, Transaction)>;

    /// Most recent transactions first.
    async fn list_transactions(&self, user_id: UserId, limit: usize) -> Result<Vec<Transaction>>;
}

/// Lookup and update of marketplace accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn store(&self, user: User) -> Result<()>;
    async fn get(&self, user_id: UserId) -> Result<Option<User>>;
    async fn find_by_token(&self, token: &str) -> Result<Option<User>>;
}

/// Durable record of payment pushes awaiting a gateway result.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    async fn store(&self, checkout: PendingCheckout) -> Result<()>;
    async fn get(&self, checkout_request_id: &str) -> Result<Option<PendingCheckout>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushRequest {
    pub phone_number: PhoneNumber,
    pub amount_kes: u32,
    pub account_reference: String,
    pub description: String,
}

/// The gateway's acknowledgement of an accepted push.
#[derive(Debug, Clone, PartialEq)]
pub struct PushReceipt {
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    /// Untouched response body, returned to the client as-is.
    pub raw: serde_json::Value,
}

/// Outbound mobile-money push payments.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn request_push(&self, request: PushRequest) -> Result<PushReceipt>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
pub type UserStoreRef = Arc<dyn UserStore>;
pub type CheckoutStoreRef = Arc<dyn CheckoutStore>;
pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
