use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("{0}")]
    InvalidPhoneNumber(String),
    #[error("Gateway authentication failed: {0}")]
    GatewayAuth(String),
    #[error("Gateway request failed: {0}")]
    GatewayRequest(String),
    #[error("Wallet not found")]
    WalletNotFound,
    #[error("Minimum withdrawal is KES 2000")]
    BelowMinimumWithdrawal,
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("Wallet balance changed concurrently")]
    BalanceConflict,
    #[error("Account already activated")]
    AlreadyActivated,
    #[error("User not found")]
    UserNotFound,
    #[error("Checkout not found")]
    CheckoutNotFound,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Callback rejected: {0}")]
    CallbackRejected(String),
    #[error("Invalid callback payload: {0}")]
    InvalidCallback(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        Self::Storage(err.into_string())
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(format!("Serialization error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
