//! Maps domain errors onto HTTP responses.
//!
//! Bodies are always `{"error": "<message>"}`; storage failures are redacted.

use crate::error::PaymentError;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::error;

impl ResponseError for PaymentError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPhoneNumber(_)
            | Self::BelowMinimumWithdrawal
            | Self::InsufficientBalance
            | Self::AlreadyActivated
            | Self::InvalidCallback(_)
            | Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::CallbackRejected(_) => StatusCode::FORBIDDEN,
            Self::WalletNotFound | Self::CheckoutNotFound | Self::UserNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::BalanceConflict => StatusCode::CONFLICT,
            Self::GatewayAuth(_)
            | Self::GatewayRequest(_)
            | Self::Storage(_)
            | Self::Csv(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::Storage(_) | Self::Csv(_) | Self::Io(_) => {
                error!(error = %self, "request failed on storage");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}
