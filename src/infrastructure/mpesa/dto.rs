//! Wire schemas for the M-Pesa Express API.

use crate::domain::checkout::PaymentResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

pub const PAYBILL_TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct StkPushPayload<'a> {
    pub business_short_code: &'a str,
    pub password: String,
    pub timestamp: String,
    pub transaction_type: &'static str,
    pub amount: u32,
    pub party_a: &'a str,
    pub party_b: &'a str,
    pub phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    pub callback_url: &'a str,
    pub account_reference: &'a str,
    pub transaction_desc: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
}

/// `{"Body": {"stkCallback": {...}}}` as posted to the callback URL.
#[derive(Debug, Deserialize)]
pub struct CallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: CallbackBody,
}

#[derive(Debug, Deserialize)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub items: Vec<MetadataItem>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<Value>,
}

impl StkCallback {
    fn metadata(&self, name: &str) -> Option<&Value> {
        self.callback_metadata
            .as_ref()?
            .items
            .iter()
            .find(|item| item.name == name)?
            .value
            .as_ref()
    }

    pub fn receipt_number(&self) -> Option<String> {
        self.metadata("MpesaReceiptNumber")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn paid_amount(&self) -> Option<Decimal> {
        match self.metadata("Amount")? {
            Value::Number(n) => n.to_string().parse().ok(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl From<StkCallback> for PaymentResult {
    fn from(callback: StkCallback) -> Self {
        Self {
            receipt_number: callback.receipt_number(),
            paid_amount: callback.paid_amount(),
            checkout_request_id: callback.checkout_request_id,
            result_code: callback.result_code,
            result_desc: callback.result_desc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUCCESS: &str = r#"{
        "Body": {"stkCallback": {
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResultCode": 0,
            "ResultDesc": "The service request is processed successfully.",
            "CallbackMetadata": {"Item": [
                {"Name": "Amount", "Value": 300.00},
                {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"},
                {"Name": "Balance"},
                {"Name": "TransactionDate", "Value": 20191219102115},
                {"Name": "PhoneNumber", "Value": 254708374149}
            ]}
        }}
    }"#;

    #[test]
    fn test_success_callback_metadata() {
        let envelope: CallbackEnvelope = serde_json::from_str(SUCCESS).unwrap();
        let cb = envelope.body.stk_callback;
        assert_eq!(cb.result_code, 0);
        assert_eq!(cb.receipt_number().as_deref(), Some("NLJ7RT61SV"));
        assert_eq!(cb.paid_amount(), Some(rust_decimal_macros::dec!(300)));
    }

    #[test]
    fn test_cancelled_callback_has_no_metadata() {
        let raw = r#"{"Body":{"stkCallback":{"MerchantRequestID":"1","CheckoutRequestID":"ws_CO_2","ResultCode":1032,"ResultDesc":"Request cancelled by user"}}}"#;
        let envelope: CallbackEnvelope = serde_json::from_str(raw).unwrap();
        let result = PaymentResult::from(envelope.body.stk_callback);
        assert_eq!(result.result_code, 1032);
        assert!(!result.is_success());
        assert!(result.receipt_number.is_none());
    }

    #[test]
    fn test_callback_missing_checkout_id_rejected() {
        let raw = r#"{"Body":{"stkCallback":{"ResultCode":0}}}"#;
        assert!(serde_json::from_str::<CallbackEnvelope>(raw).is_err());
    }

    #[test]
    fn test_push_payload_field_names() {
        let payload = StkPushPayload {
            business_short_code: "174379",
            password: "cGFzcw==".to_string(),
            timestamp: "20240101120000".to_string(),
            transaction_type: PAYBILL_TRANSACTION_TYPE,
            amount: 300,
            party_a: "254712345678",
            party_b: "174379",
            phone_number: "254712345678",
            callback_url: "https://example.com/cb",
            account_reference: "ACTIVATE-1",
            transaction_desc: "FreelancerKE Activation Fee",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["BusinessShortCode"], "174379");
        assert_eq!(json["TransactionType"], "CustomerPayBillOnline");
        assert_eq!(json["Amount"], 300);
        assert_eq!(json["PartyA"], "254712345678");
        assert_eq!(json["CallBackURL"], "https://example.com/cb");
        assert_eq!(json["AccountReference"], "ACTIVATE-1");
        assert_eq!(json["TransactionDesc"], "FreelancerKE Activation Fee");
    }
}
