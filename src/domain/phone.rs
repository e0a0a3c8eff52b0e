use crate::error::PaymentError;
use std::fmt;

const COUNTRY_CODE: &str = "254";
const LOCAL_LEN: usize = 10;
const INTERNATIONAL_LEN: usize = 12;

fn invalid_length() -> PaymentError {
    PaymentError::InvalidPhoneNumber("Invalid phone number".to_string())
}

/// A Kenyan MSISDN in the `2547XXXXXXXX` form the gateway expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalizes a local `0…` number (10 digits) into international form.
    ///
    /// Numbers already carrying the `254` prefix (12 digits) pass through.
    pub fn parse(input: &str) -> Result<Self, PaymentError> {
        let input = input.trim();
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid_length());
        }

        if let Some(rest) = input.strip_prefix('0') {
            if input.len() != LOCAL_LEN {
                return Err(invalid_length());
            }
            Ok(Self(format!("{}{}", COUNTRY_CODE, rest)))
        } else if input.starts_with(COUNTRY_CODE) {
            if input.len() != INTERNATIONAL_LEN {
                return Err(invalid_length());
            }
            Ok(Self(input.to_string()))
        } else if input.len() == LOCAL_LEN {
            Err(PaymentError::InvalidPhoneNumber(
                "Phone must start with 0 or 254".to_string(),
            ))
        } else {
            Err(invalid_length())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
