mod common;

use common::{callback_bytes, harness, harness_with_ttl};
use freelance_pay::application::callback::CallbackOutcome;
use freelance_pay::domain::checkout::{CheckoutPurpose, CheckoutStatus};
use freelance_pay::domain::ports::{CheckoutStore, UserStore};
use freelance_pay::domain::wallet::Balance;
use freelance_pay::error::PaymentError;
use freelance_pay::infrastructure::mpesa::parse_callback;
use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn test_activation_end_to_end() {
    let h = harness().await;

    let receipt = h
        .state
        .activation
        .initiate_activation(1, "0798765432")
        .await
        .unwrap();
    assert_eq!(receipt.raw["ResponseCode"], "0");

    let requests = h.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].phone_number.as_str(), "254798765432");
    assert_eq!(requests[0].amount_kes, 300);
    assert_eq!(requests[0].account_reference, "ACTIVATE-1");
    assert_eq!(requests[0].description, "FreelancerKE Activation Fee");
    assert_eq!(h.cache.len(), 1);
    assert!(!h.state.activation.activation_status(1).await.unwrap());

    let result = parse_callback(&callback_bytes(&receipt.checkout_request_id, 0, 300)).unwrap();
    let outcome = h.state.callbacks.handle(result).await.unwrap();

    assert_eq!(outcome, CallbackOutcome::Activated);
    assert!(h.state.activation.activation_status(1).await.unwrap());
    assert!(h.cache.is_empty());
    let checkout = h
        .checkouts
        .get(&receipt.checkout_request_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkout.status, CheckoutStatus::Confirmed);
    assert_eq!(checkout.receipt_number.as_deref(), Some("NLJ7RT61SV"));
}

#[tokio::test]
async fn test_cancelled_payment_leaves_account_inactive() {
    let h = harness().await;
    let receipt = h
        .state
        .activation
        .initiate_activation(1, "254798765432")
        .await
        .unwrap();

    let result = parse_callback(&callback_bytes(&receipt.checkout_request_id, 1032, 0)).unwrap();
    let outcome = h.state.callbacks.handle(result).await.unwrap();

    assert_eq!(outcome, CallbackOutcome::PaymentFailed);
    assert!(!h.state.activation.activation_status(1).await.unwrap());

    // A user may try again after a cancelled prompt.
    assert!(
        h.state
            .activation
            .initiate_activation(1, "0798765432")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_invalid_phone_never_reaches_gateway() {
    let h = harness().await;
    let err = h
        .state
        .activation
        .initiate_activation(1, "0712")
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::InvalidPhoneNumber(_)));
    assert!(h.gateway.requests().is_empty());
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_already_activated_rejected() {
    let h = harness().await;
    let mut user = h.users.get(1).await.unwrap().unwrap();
    user.is_activated = true;
    h.users.store(user).await.unwrap();

    let err = h
        .state
        .activation
        .initiate_activation(1, "0798765432")
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::AlreadyActivated));
    assert!(h.gateway.requests().is_empty());
}

#[tokio::test]
async fn test_gateway_rejection_leaves_no_trace() {
    let h = harness().await;
    h.gateway.reject.store(true, Ordering::SeqCst);

    let err = h
        .state
        .activation
        .initiate_activation(1, "0798765432")
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::GatewayRequest(_)));
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn test_duplicate_callback_is_idempotent() {
    let h = harness().await;
    let receipt = h
        .state
        .checkouts
        .initiate_top_up(1, "0798765432", 1200)
        .await
        .unwrap();
    assert_eq!(h.gateway.requests()[0].account_reference, "TOPUP-1");

    let body = callback_bytes(&receipt.checkout_request_id, 0, 1200);
    let first = h
        .state
        .callbacks
        .handle(parse_callback(&body).unwrap())
        .await
        .unwrap();
    let second = h
        .state
        .callbacks
        .handle(parse_callback(&body).unwrap())
        .await
        .unwrap();

    assert_eq!(first, CallbackOutcome::Credited);
    assert_eq!(second, CallbackOutcome::Duplicate);
    assert_eq!(
        h.state.wallets.get_balance(1).await.unwrap(),
        Balance::new(dec!(1200))
    );
    let history = h.state.wallets.list_recent(1, 20).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].description, "M-Pesa top-up NLJ7RT61SV");
}

#[tokio::test]
async fn test_callback_survives_cache_eviction() {
    let h = harness_with_ttl(Duration::from_millis(10)).await;
    let receipt = h
        .state
        .activation
        .initiate_activation(1, "0798765432")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let status = h
        .state
        .checkouts
        .status(1, &receipt.checkout_request_id)
        .await
        .unwrap();
    assert_eq!(status.status, CheckoutStatus::Expired);
    assert_eq!(status.purpose, CheckoutPurpose::Activation);

    // The payment went through after all: a confirmed payment is honoured.
    let result = parse_callback(&callback_bytes(&receipt.checkout_request_id, 0, 300)).unwrap();
    let outcome = h.state.callbacks.handle(result).await.unwrap();
    assert_eq!(outcome, CallbackOutcome::Activated);
    assert!(h.state.activation.activation_status(1).await.unwrap());
}

#[tokio::test]
async fn test_checkout_status_hidden_from_other_users() {
    let h = harness().await;
    let receipt = h
        .state
        .activation
        .initiate_activation(1, "0798765432")
        .await
        .unwrap();
    let err = h
        .state
        .checkouts
        .status(2, &receipt.checkout_request_id)
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::CheckoutNotFound));
}
