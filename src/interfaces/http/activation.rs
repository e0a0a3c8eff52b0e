use super::auth::AuthenticatedUser;
use super::state::HttpState;
use crate::error::PaymentError;
use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct PhoneRequest {
    #[serde(default)]
    pub phone_number: String,
}

/// Pushes the activation fee to the caller's phone and relays the gateway's
/// acknowledgement untouched.
#[post("/api/activation/initiate")]
pub async fn initiate_activation(
    state: web::Data<HttpState>,
    AuthenticatedUser(user): AuthenticatedUser,
    body: web::Json<PhoneRequest>,
) -> Result<HttpResponse, PaymentError> {
    let receipt = state
        .activation
        .initiate_activation(user.id, &body.phone_number)
        .await?;
    Ok(HttpResponse::Ok().json(receipt.raw))
}

#[get("/api/activation/status")]
pub async fn activation_status(
    state: web::Data<HttpState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<HttpResponse, PaymentError> {
    let is_activated = state.activation.activation_status(user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "is_activated": is_activated })))
}

#[get("/api/checkouts/{checkout_request_id}")]
pub async fn checkout_status(
    state: web::Data<HttpState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, PaymentError> {
    let checkout = state.checkouts.status(user.id, &path).await?;
    Ok(HttpResponse::Ok().json(checkout))
}
