//! JSON API over actix-web.
//!
//! Every route except the gateway callback requires `Authorization: Token <key>`.

pub mod activation;
pub mod auth;
pub mod callback;
pub mod error;
pub mod state;
pub mod trace;
pub mod wallet;

use crate::error::PaymentError;
use actix_web::web;

pub use state::{HttpState, HttpStatePorts};

/// Registers every route. The caller supplies `web::Data<HttpState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        PaymentError::ValidationError(err.to_string()).into()
    }))
    .service(activation::initiate_activation)
    .service(activation::activation_status)
    .service(activation::checkout_status)
    .service(callback::mpesa_callback)
    .service(wallet::balance)
    .service(wallet::transactions)
    .service(wallet::withdraw)
    .service(wallet::top_up);
}
