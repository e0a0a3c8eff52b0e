use super::checkout::CheckoutService;
use crate::domain::checkout::CheckoutPurpose;
use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{PushReceipt, UserStoreRef};
use crate::domain::user::UserId;
use crate::error::{PaymentError, Result};

/// One-off fee that unlocks task browsing and applications.
pub const ACTIVATION_FEE_KES: u32 = 300;
pub const ACTIVATION_DESCRIPTION: &str = "FreelancerKE Activation Fee";

/// Pay-to-activate flow. Only starts the payment: the account is flipped to
/// activated by the callback handler once the gateway confirms it.
#[derive(Clone)]
pub struct ActivationService {
    users: UserStoreRef,
    checkouts: CheckoutService,
}

impl ActivationService {
    pub fn new(users: UserStoreRef, checkouts: CheckoutService) -> Self {
        Self { users, checkouts }
    }

    pub async fn initiate_activation(
        &self,
        user_id: UserId,
        phone_number: &str,
    ) -> Result<PushReceipt> {
        let phone_number = PhoneNumber::parse(phone_number)?;
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(PaymentError::UserNotFound)?;
        if user.is_activated {
            return Err(PaymentError::AlreadyActivated);
        }

        self.checkouts
            .begin(
                user_id,
                phone_number,
                CheckoutPurpose::Activation,
                ACTIVATION_FEE_KES,
                ACTIVATION_DESCRIPTION,
            )
            .await
    }

    pub async fn activation_status(&self, user_id: UserId) -> Result<bool> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(PaymentError::UserNotFound)?;
        Ok(user.is_activated)
    }
}
