use super::auth::AuthenticatedUser;
use super::state::HttpState;
use crate::application::wallet::RECENT_TRANSACTIONS_LIMIT;
use crate::domain::transaction::{Transaction, TransactionType};
use crate::error::PaymentError;
use actix_web::{HttpResponse, get, post, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// A ledger entry as shown to its owner.
#[derive(Debug, Serialize)]
pub struct TransactionView {
    pub id: u64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub description: String,
    pub amount: String,
    /// Calendar date (`YYYY-MM-DD`) the entry was recorded.
    pub date: String,
}

impl From<Transaction> for TransactionView {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            transaction_type: tx.transaction_type,
            description: tx.description,
            amount: tx.amount.value().to_string(),
            date: tx.created_at.date_naive().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WithdrawRequest {
    amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    #[serde(default)]
    pub phone_number: String,
    pub amount: u32,
}

#[get("/api/wallet/balance")]
pub async fn balance(
    state: web::Data<HttpState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<HttpResponse, PaymentError> {
    let balance = state.wallets.get_balance(user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "balance": balance.to_string() })))
}

#[get("/api/wallet/transactions")]
pub async fn transactions(
    state: web::Data<HttpState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<HttpResponse, PaymentError> {
    let history: Vec<TransactionView> = state
        .wallets
        .list_recent(user.id, RECENT_TRANSACTIONS_LIMIT)
        .await?
        .into_iter()
        .map(TransactionView::from)
        .collect();
    Ok(HttpResponse::Ok().json(history))
}

/// An empty body withdraws the whole balance.
#[post("/api/wallet/withdraw")]
pub async fn withdraw(
    state: web::Data<HttpState>,
    AuthenticatedUser(user): AuthenticatedUser,
    body: web::Bytes,
) -> Result<HttpResponse, PaymentError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        WithdrawRequest::default()
    } else {
        serde_json::from_slice::<WithdrawRequest>(&body)
            .map_err(|_| PaymentError::ValidationError("Invalid amount".to_string()))?
    };

    let new_balance = state
        .wallets
        .request_withdrawal(user.id, request.amount)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Withdrawal initiated",
        "new_balance": new_balance.to_string(),
    })))
}

#[post("/api/wallet/top-up")]
pub async fn top_up(
    state: web::Data<HttpState>,
    AuthenticatedUser(user): AuthenticatedUser,
    body: web::Json<TopUpRequest>,
) -> Result<HttpResponse, PaymentError> {
    let receipt = state
        .checkouts
        .initiate_top_up(user.id, &body.phone_number, body.amount)
        .await?;
    Ok(HttpResponse::Ok().json(receipt.raw))
}
