use serde::{Deserialize, Serialize};

pub type UserId = u64;

/// The slice of a marketplace account the payment core reads and writes.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// Opaque API token issued by the account service.
    pub auth_token: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub is_activated: bool,
}

impl User {
    pub fn new(id: UserId, email: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            auth_token: auth_token.into(),
            phone_number: None,
            is_activated: false,
        }
    }
}
