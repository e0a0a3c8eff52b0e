//! Reqwest-backed M-Pesa Express (STK push) adapter.
//!
//! Owns transport details only: credential exchange, payload signing,
//! HTTP error mapping and decoding of provider responses.

pub mod dto;

use crate::config::GatewayConfig;
use crate::domain::checkout::PaymentResult;
use crate::domain::ports::{PaymentGateway, PushReceipt, PushRequest};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use dto::{
    AccessTokenResponse, CallbackEnvelope, PAYBILL_TRANSACTION_TYPE, StkPushPayload,
    StkPushResponse,
};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, info};

const TOKEN_PATH: &str = "oauth/v1/generate";
const STK_PUSH_PATH: &str = "mpesa/stkpush/v1/processrequest";
/// The gateway expects timestamps in East Africa Time (UTC+3).
const EAT_OFFSET_HOURS: i64 = 3;

/// `YYYYMMDDHHmmss` in East Africa Time.
pub fn timestamp(now: DateTime<Utc>) -> String {
    (now.naive_utc() + Duration::hours(EAT_OFFSET_HOURS))
        .format("%Y%m%d%H%M%S")
        .to_string()
}

/// `base64(short_code ‖ passkey ‖ timestamp)`.
pub fn password(short_code: &str, passkey: &str, timestamp: &str) -> String {
    STANDARD.encode(format!("{}{}{}", short_code, passkey, timestamp))
}

/// Decodes a callback body into the gateway's reported result.
pub fn parse_callback(body: &[u8]) -> Result<PaymentResult> {
    let envelope: CallbackEnvelope = serde_json::from_slice(body)
        .map_err(|e| PaymentError::InvalidCallback(e.to_string()))?;
    Ok(envelope.body.stk_callback.into())
}

pub struct MpesaClient {
    client: Client,
    base_url: Url,
    config: GatewayConfig,
}

impl MpesaClient {
    /// Builds a client with the configured request timeout.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let mut base_url = config
            .resolved_base_url()
            .map_err(|e| PaymentError::ValidationError(format!("invalid gateway URL: {}", e)))?;
        // Endpoints are joined as relative paths, which replace a last segment
        // lacking a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PaymentError::GatewayRequest(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| PaymentError::ValidationError(format!("invalid gateway URL: {}", e)))
    }

    /// Exchanges the consumer key and secret for a short-lived bearer token.
    pub async fn access_token(&self) -> Result<String> {
        let response = self
            .client
            .get(self.endpoint(TOKEN_PATH)?)
            .query(&[("grant_type", "client_credentials")])
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await
            .map_err(|e| PaymentError::GatewayAuth(format!("transport error: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PaymentError::GatewayAuth(format!("transport error: {}", e)))?;
        if !status.is_success() {
            return Err(PaymentError::GatewayAuth(status_message(status, &body)));
        }

        let token: AccessTokenResponse = serde_json::from_slice(&body)
            .map_err(|e| PaymentError::GatewayAuth(format!("malformed token response: {}", e)))?;
        if token.access_token.is_empty() {
            return Err(PaymentError::GatewayAuth(
                "malformed token response: empty access_token".to_string(),
            ));
        }
        debug!("obtained gateway access token");
        Ok(token.access_token)
    }
}

fn status_message(status: StatusCode, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        format!("gateway returned {}", status)
    } else {
        format!("gateway returned {}: {}", status, text)
    }
}

#[async_trait]
impl PaymentGateway for MpesaClient {
    async fn request_push(&self, request: PushRequest) -> Result<PushReceipt> {
        let token = self.access_token().await?;
        let timestamp = timestamp(Utc::now());
        let payload = StkPushPayload {
            business_short_code: &self.config.short_code,
            password: password(&self.config.short_code, &self.config.passkey, &timestamp),
            timestamp,
            transaction_type: PAYBILL_TRANSACTION_TYPE,
            amount: request.amount_kes,
            party_a: request.phone_number.as_str(),
            party_b: &self.config.short_code,
            phone_number: request.phone_number.as_str(),
            callback_url: self.config.callback_url.as_str(),
            account_reference: &request.account_reference,
            transaction_desc: &request.description,
        };

        let response = self
            .client
            .post(self.endpoint(STK_PUSH_PATH)?)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PaymentError::GatewayRequest(format!("transport error: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| PaymentError::GatewayRequest(format!("transport error: {}", e)))?;
        if !status.is_success() {
            return Err(PaymentError::GatewayRequest(status_message(status, &body)));
        }

        let raw: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| PaymentError::GatewayRequest(format!("malformed push response: {}", e)))?;
        let ack: StkPushResponse = serde_json::from_value(raw.clone())
            .map_err(|e| PaymentError::GatewayRequest(format!("malformed push response: {}", e)))?;
        if ack.response_code != "0" {
            return Err(PaymentError::GatewayRequest(format!(
                "push rejected ({}): {}",
                ack.response_code, ack.response_description
            )));
        }

        info!(
            checkout_request_id = %ack.checkout_request_id,
            account_reference = %request.account_reference,
            amount_kes = request.amount_kes,
            "payment push accepted"
        );
        Ok(PushReceipt {
            checkout_request_id: ack.checkout_request_id,
            merchant_request_id: ack.merchant_request_id,
            raw,
        })
    }
}
