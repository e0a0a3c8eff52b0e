use super::locks::CheckoutLocks;
use super::wallet::WalletService;
use crate::domain::checkout::{CheckoutPurpose, PaymentResult, PendingCheckout};
use crate::domain::ports::{CheckoutStoreRef, UserStoreRef};
use crate::domain::user::UserId;
use crate::domain::wallet::Amount;
use crate::error::Result;
use crate::infrastructure::correlation_cache::CorrelationCache;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

/// What a gateway callback ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Activated,
    Credited,
    /// The gateway reported a failed or cancelled payment.
    PaymentFailed,
    /// The checkout was already settled by an earlier callback.
    Duplicate,
    /// Neither the cache nor the checkout store knows the id.
    Unattributed,
    /// Payment confirmed, but its user no longer exists.
    UserMissing,
}

/// Applies asynchronous payment results reported by the gateway.
///
/// Resolution goes through the correlation cache first and the durable
/// checkout store second. Callbacks hold the checkout's lock for the whole
/// settlement, so deliveries of one id run one at a time and settle at most
/// once.
#[derive(Clone)]
pub struct CallbackHandler {
    users: UserStoreRef,
    checkouts: CheckoutStoreRef,
    wallets: WalletService,
    cache: CorrelationCache,
    locks: CheckoutLocks,
}

impl CallbackHandler {
    /// `locks` must be the ones the checkout service uses for the same store.
    pub fn new(
        users: UserStoreRef,
        checkouts: CheckoutStoreRef,
        wallets: WalletService,
        cache: CorrelationCache,
        locks: CheckoutLocks,
    ) -> Self {
        Self {
            users,
            checkouts,
            wallets,
            cache,
            locks,
        }
    }

    pub async fn handle(&self, result: PaymentResult) -> Result<CallbackOutcome> {
        let _guard = self.locks.acquire(&result.checkout_request_id).await;
        self.settle(result).await
    }

    async fn settle(&self, result: PaymentResult) -> Result<CallbackOutcome> {
        let id = result.checkout_request_id.as_str();
        let cached_user = self.cache.take(id);

        let Some(mut checkout) = self.checkouts.get(id).await? else {
            return self.settle_uncached_record(&result, cached_user).await;
        };

        if let Some(user_id) = cached_user
            && user_id != checkout.user_id
        {
            warn!(
                checkout_request_id = id,
                cached_user = user_id,
                recorded_user = checkout.user_id,
                "correlation cache disagrees with checkout record, using the record"
            );
        }

        let previous = checkout.clone();
        if !checkout.settle(result.result_code, result.receipt_number.clone()) {
            info!(checkout_request_id = id, status = ?checkout.status, "checkout already settled");
            return Ok(CallbackOutcome::Duplicate);
        }

        // The settled status is persisted before any side effect: a redelivery
        // can then only see a terminal record.
        self.checkouts.store(checkout.clone()).await?;

        if !result.is_success() {
            info!(
                checkout_request_id = id,
                user_id = checkout.user_id,
                result_code = result.result_code,
                result_desc = %result.result_desc,
                "payment failed or cancelled"
            );
            self.locks.forget(id);
            return Ok(CallbackOutcome::PaymentFailed);
        }

        warn_on_amount_mismatch(&checkout, result.paid_amount);
        match self.apply(&checkout).await {
            Ok(outcome) => {
                self.locks.forget(id);
                Ok(outcome)
            }
            Err(e) => {
                self.restore(previous).await;
                Err(e)
            }
        }
    }

    /// Puts back the pre-settlement record so a redelivery can retry.
    async fn restore(&self, previous: PendingCheckout) {
        let id = previous.checkout_request_id.clone();
        match self.checkouts.store(previous).await {
            Ok(()) => warn!(checkout_request_id = %id, "payment not applied, checkout reopened"),
            Err(e) => error!(
                checkout_request_id = %id,
                error = %e,
                "payment not applied and checkout could not be reopened"
            ),
        }
    }

    /// Fallback for a cache hit with no durable record: only activation
    /// checkouts ever lived solely in the cache.
    async fn settle_uncached_record(
        &self,
        result: &PaymentResult,
        cached_user: Option<UserId>,
    ) -> Result<CallbackOutcome> {
        let Some(user_id) = cached_user else {
            warn!(
                checkout_request_id = %result.checkout_request_id,
                result_code = result.result_code,
                "reconciliation gap: callback for unknown checkout"
            );
            self.locks.forget(&result.checkout_request_id);
            return Ok(CallbackOutcome::Unattributed);
        };
        if !result.is_success() {
            return Ok(CallbackOutcome::PaymentFailed);
        }
        self.activate(user_id).await
    }

    async fn apply(&self, checkout: &PendingCheckout) -> Result<CallbackOutcome> {
        match checkout.purpose {
            CheckoutPurpose::Activation => self.activate(checkout.user_id).await,
            CheckoutPurpose::WalletTopUp => {
                let amount = Amount::new(Decimal::from(checkout.amount_kes))?;
                let description = match &checkout.receipt_number {
                    Some(receipt) => format!("M-Pesa top-up {}", receipt),
                    None => "M-Pesa top-up".to_string(),
                };
                self.wallets.credit(checkout.user_id, amount, description).await?;
                Ok(CallbackOutcome::Credited)
            }
        }
    }

    async fn activate(&self, user_id: UserId) -> Result<CallbackOutcome> {
        let Some(mut user) = self.users.get(user_id).await? else {
            warn!(user_id, "payment confirmed for a user that no longer exists");
            return Ok(CallbackOutcome::UserMissing);
        };
        user.is_activated = true;
        self.users.store(user).await?;
        info!(user_id, "account activated");
        Ok(CallbackOutcome::Activated)
    }
}

fn warn_on_amount_mismatch(checkout: &PendingCheckout, paid: Option<Decimal>) {
    if let Some(paid) = paid
        && paid != Decimal::from(checkout.amount_kes)
    {
        warn!(
            checkout_request_id = %checkout.checkout_request_id,
            expected = checkout.amount_kes,
            paid = %paid,
            "paid amount differs from the requested amount"
        );
    }
}
