use crate::domain::user::UserId;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a confirmed payment unlocks.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPurpose {
    Activation,
    WalletTopUp,
}

impl CheckoutPurpose {
    pub fn account_reference(&self, user_id: UserId) -> String {
        match self {
            Self::Activation => format!("ACTIVATE-{}", user_id),
            Self::WalletTopUp => format!("TOPUP-{}", user_id),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    Initiated,
    Confirmed,
    Failed,
    Expired,
}

impl CheckoutStatus {
    /// Confirmed and failed checkouts never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }
}

/// A payment push awaiting the gateway's asynchronous result.
///
/// Persisted when the push is accepted so the callback can be attributed
/// even after the correlation cache has forgotten the checkout id.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PendingCheckout {
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub user_id: UserId,
    pub purpose: CheckoutPurpose,
    pub amount_kes: u32,
    pub status: CheckoutStatus,
    pub result_code: Option<i64>,
    pub receipt_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PendingCheckout {
    pub fn initiated(
        checkout_request_id: String,
        merchant_request_id: String,
        user_id: UserId,
        purpose: CheckoutPurpose,
        amount_kes: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            checkout_request_id,
            merchant_request_id,
            user_id,
            purpose,
            amount_kes,
            status: CheckoutStatus::Initiated,
            result_code: None,
            receipt_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Records the gateway result. Returns `false` if the checkout was already settled.
    pub fn settle(&mut self, result_code: i64, receipt_number: Option<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = if result_code == 0 {
            CheckoutStatus::Confirmed
        } else {
            CheckoutStatus::Failed
        };
        self.result_code = Some(result_code);
        self.receipt_number = receipt_number;
        self.updated_at = Utc::now();
        true
    }

    /// Marks an initiated checkout as expired once `ttl` has elapsed since creation.
    pub fn expire_if_stale(&mut self, ttl: Duration, now: DateTime<Utc>) -> bool {
        if self.status == CheckoutStatus::Initiated && now - self.created_at >= ttl {
            self.status = CheckoutStatus::Expired;
            self.updated_at = now;
            true
        } else {
            false
        }
    }
}

/// The outcome the gateway reports for one checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentResult {
    pub checkout_request_id: String,
    pub result_code: i64,
    pub result_desc: String,
    pub receipt_number: Option<String>,
    /// Amount the payer actually sent, when the gateway reports it.
    pub paid_amount: Option<Decimal>,
}

impl PaymentResult {
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }
}
