use super::state::HttpState;
use crate::error::PaymentError;
use crate::infrastructure::mpesa;
use actix_web::{HttpRequest, HttpResponse, post, web};
use tracing::{debug, error, warn};

/// Gateway result notifications. Unauthenticated; the gateway only needs to
/// see `OK` once the payload parsed, whatever processing made of it.
#[post("/api/mpesa/callback")]
pub async fn mpesa_callback(
    req: HttpRequest,
    state: web::Data<HttpState>,
    body: web::Bytes,
) -> Result<HttpResponse, PaymentError> {
    let peer = req.peer_addr().map(|addr| addr.ip());
    if !state.callback_allowed(peer) {
        warn!(?peer, "callback from a source outside the allowlist");
        return Err(PaymentError::CallbackRejected(
            "source address not allowed".to_string(),
        ));
    }

    let result = mpesa::parse_callback(&body)?;
    let checkout_request_id = result.checkout_request_id.clone();
    match state.callbacks.handle(result).await {
        Ok(outcome) => debug!(%checkout_request_id, ?outcome, "callback processed"),
        Err(e) => error!(%checkout_request_id, error = %e, "callback processing failed"),
    }

    Ok(HttpResponse::Ok().content_type("text/plain").body("OK"))
}
