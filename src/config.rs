//! Runtime configuration, parsed from flags with environment fallbacks.

use clap::{Args, ValueEnum};
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use url::Url;

const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
const LIVE_BASE_URL: &str = "https://api.safaricom.co.ke";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GatewayEnvironment {
    Sandbox,
    Live,
}

/// Credentials and endpoints for the M-Pesa Express (STK push) API.
#[derive(Args, Clone)]
pub struct GatewayConfig {
    /// Paybill / till short code.
    #[arg(long, env = "MPESA_SHORTCODE")]
    pub short_code: String,

    #[arg(long, env = "MPESA_PASSKEY", hide_env_values = true)]
    pub passkey: String,

    #[arg(long, env = "MPESA_CONSUMER_KEY", hide_env_values = true)]
    pub consumer_key: String,

    #[arg(long, env = "MPESA_CONSUMER_SECRET", hide_env_values = true)]
    pub consumer_secret: String,

    /// Public URL the gateway posts payment results to.
    #[arg(long, env = "MPESA_CALLBACK_URL")]
    pub callback_url: Url,

    #[arg(long, env = "MPESA_ENVIRONMENT", value_enum, default_value_t = GatewayEnvironment::Sandbox)]
    pub environment: GatewayEnvironment,

    /// Overrides the environment's base URL.
    #[arg(long, env = "MPESA_BASE_URL")]
    pub base_url: Option<Url>,

    #[arg(long, env = "MPESA_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn resolved_base_url(&self) -> Result<Url, url::ParseError> {
        if let Some(url) = &self.base_url {
            return Ok(url.clone());
        }
        let raw = match self.environment {
            GatewayEnvironment::Sandbox => SANDBOX_BASE_URL,
            GatewayEnvironment::Live => LIVE_BASE_URL,
        };
        Url::parse(raw)
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("short_code", &self.short_code)
            .field("passkey", &"<redacted>")
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("callback_url", &self.callback_url.as_str())
            .field("environment", &self.environment)
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: String,

    /// CSV file of accounts to load at startup (id,email,auth_token,phone_number,is_activated).
    #[arg(long, env = "USERS_CSV")]
    pub users: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    /// Requires the `storage-rocksdb` feature.
    #[arg(long, env = "DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// How long a checkout id stays in the correlation cache.
    #[arg(long, env = "CHECKOUT_TTL_SECS", default_value_t = 3600)]
    pub checkout_ttl_secs: u64,

    /// Source addresses allowed to post gateway callbacks. Empty accepts any.
    #[arg(long = "callback-allow-ip", env = "CALLBACK_ALLOW_IPS", value_delimiter = ',')]
    pub callback_allowlist: Vec<IpAddr>,
}
