use super::locks::CheckoutLocks;
use crate::domain::checkout::{CheckoutPurpose, PendingCheckout};
use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{CheckoutStoreRef, PaymentGatewayRef, PushReceipt, PushRequest};
use crate::domain::user::UserId;
use crate::error::{PaymentError, Result};
use crate::infrastructure::correlation_cache::CorrelationCache;
use chrono::{TimeDelta, Utc};
use tracing::info;

pub const TOP_UP_DESCRIPTION: &str = "FreelancerKE Wallet Top-up";

/// Starts payment pushes and tracks them until the gateway reports back.
#[derive(Clone)]
pub struct CheckoutService {
    gateway: PaymentGatewayRef,
    checkouts: CheckoutStoreRef,
    cache: CorrelationCache,
    locks: CheckoutLocks,
}

impl CheckoutService {
    pub fn new(
        gateway: PaymentGatewayRef,
        checkouts: CheckoutStoreRef,
        cache: CorrelationCache,
    ) -> Self {
        Self {
            gateway,
            checkouts,
            cache,
            locks: CheckoutLocks::new(),
        }
    }

    /// Per-checkout locks; the callback handler must share them.
    pub fn locks(&self) -> CheckoutLocks {
        self.locks.clone()
    }

    /// Sends the push, records the pending checkout, then caches its id.
    ///
    /// Nothing is recorded if the gateway refuses the push.
    pub async fn begin(
        &self,
        user_id: UserId,
        phone_number: PhoneNumber,
        purpose: CheckoutPurpose,
        amount_kes: u32,
        description: &str,
    ) -> Result<PushReceipt> {
        let receipt = self
            .gateway
            .request_push(PushRequest {
                phone_number,
                amount_kes,
                account_reference: purpose.account_reference(user_id),
                description: description.to_string(),
            })
            .await?;

        // Held until the record exists, so an early callback waits for it.
        let _guard = self.locks.acquire(&receipt.checkout_request_id).await;
        self.checkouts
            .store(PendingCheckout::initiated(
                receipt.checkout_request_id.clone(),
                receipt.merchant_request_id.clone(),
                user_id,
                purpose,
                amount_kes,
            ))
            .await?;
        self.cache.insert(receipt.checkout_request_id.clone(), user_id);

        info!(
            user_id,
            checkout_request_id = %receipt.checkout_request_id,
            ?purpose,
            "checkout initiated"
        );
        Ok(receipt)
    }

    /// Pushes a wallet top-up of a whole number of KES.
    pub async fn initiate_top_up(
        &self,
        user_id: UserId,
        phone_number: &str,
        amount_kes: u32,
    ) -> Result<PushReceipt> {
        let phone_number = PhoneNumber::parse(phone_number)?;
        if amount_kes == 0 {
            return Err(PaymentError::ValidationError(
                "Amount must be positive".to_string(),
            ));
        }
        self.begin(
            user_id,
            phone_number,
            CheckoutPurpose::WalletTopUp,
            amount_kes,
            TOP_UP_DESCRIPTION,
        )
        .await
    }

    /// The checkout as seen by its owner. Stale initiated checkouts are
    /// persisted as expired.
    pub async fn status(&self, user_id: UserId, checkout_request_id: &str) -> Result<PendingCheckout> {
        let _guard = self.locks.acquire(checkout_request_id).await;
        let mut checkout = self
            .checkouts
            .get(checkout_request_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or(PaymentError::CheckoutNotFound)?;

        let ttl = TimeDelta::from_std(self.cache.ttl()).unwrap_or(TimeDelta::MAX);
        if checkout.expire_if_stale(ttl, Utc::now()) {
            info!(user_id, checkout_request_id, "checkout expired without a result");
            self.checkouts.store(checkout.clone()).await?;
        }
        Ok(checkout)
    }
}
