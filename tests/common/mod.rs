#![allow(dead_code)]

use async_trait::async_trait;
use freelance_pay::domain::ports::{PaymentGateway, PushReceipt, PushRequest, UserStore};
use freelance_pay::domain::user::User;
use freelance_pay::error::{PaymentError, Result};
use freelance_pay::infrastructure::correlation_cache::CorrelationCache;
use freelance_pay::infrastructure::in_memory::{
    InMemoryCheckoutStore, InMemoryLedgerStore, InMemoryUserStore,
};
use freelance_pay::interfaces::http::{HttpState, HttpStatePorts};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Gateway double that accepts every push and remembers it.
#[derive(Default)]
pub struct RecordingGateway {
    pub requests: Mutex<Vec<PushRequest>>,
    pub reject: AtomicBool,
    next_id: AtomicU64,
}

impl RecordingGateway {
    pub fn requests(&self) -> Vec<PushRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn request_push(&self, request: PushRequest) -> Result<PushReceipt> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(PaymentError::GatewayRequest(
                "push rejected (1): Insufficient float".to_string(),
            ));
        }
        let id = format!("ws_CO_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.requests.lock().unwrap().push(request);
        Ok(PushReceipt {
            checkout_request_id: id.clone(),
            merchant_request_id: "29115-34620561-1".to_string(),
            raw: json!({
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": id,
                "ResponseCode": "0",
                "ResponseDescription": "Success. Request accepted for processing",
                "CustomerMessage": "Success. Request accepted for processing",
            }),
        })
    }
}

pub struct Harness {
    pub state: HttpState,
    pub users: Arc<InMemoryUserStore>,
    pub ledger: Arc<InMemoryLedgerStore>,
    pub checkouts: Arc<InMemoryCheckoutStore>,
    pub gateway: Arc<RecordingGateway>,
    pub cache: CorrelationCache,
}

/// In-memory wiring with one unactivated account (id 1, token `tok-jane`).
pub async fn harness() -> Harness {
    harness_with_ttl(Duration::from_secs(3600)).await
}

pub async fn harness_with_ttl(ttl: Duration) -> Harness {
    let users = Arc::new(InMemoryUserStore::new());
    users
        .store(User::new(1, "jane@example.com", "tok-jane"))
        .await
        .unwrap();
    let ledger = Arc::new(InMemoryLedgerStore::new());
    let checkouts = Arc::new(InMemoryCheckoutStore::new());
    let gateway = Arc::new(RecordingGateway::default());
    let cache = CorrelationCache::new(ttl);
    let state = HttpState::new(
        HttpStatePorts {
            users: users.clone(),
            ledger: ledger.clone(),
            checkouts: checkouts.clone(),
            gateway: gateway.clone(),
        },
        cache.clone(),
        vec![],
    );
    Harness {
        state,
        users,
        ledger,
        checkouts,
        gateway,
        cache,
    }
}

/// A gateway callback body as posted to the callback URL.
pub fn callback_json(checkout_request_id: &str, result_code: i64, amount: u32) -> Value {
    let mut callback = json!({
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": checkout_request_id,
        "ResultCode": result_code,
        "ResultDesc": if result_code == 0 {
            "The service request is processed successfully."
        } else {
            "Request cancelled by user"
        },
    });
    if result_code == 0 {
        callback["CallbackMetadata"] = json!({
            "Item": [
                {"Name": "Amount", "Value": amount},
                {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"},
                {"Name": "TransactionDate", "Value": 20191219102115u64},
                {"Name": "PhoneNumber", "Value": 254798765432u64}
            ]
        });
    }
    json!({ "Body": { "stkCallback": callback } })
}

pub fn callback_bytes(checkout_request_id: &str, result_code: i64, amount: u32) -> Vec<u8> {
    serde_json::to_vec(&callback_json(checkout_request_id, result_code, amount)).unwrap()
}
