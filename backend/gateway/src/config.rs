//! Configuration management for the gateway.
//!
//! Loads all required settings from environment variables.

use crate::errors::{GatewayError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Ledger JSON-RPC endpoint (e.g., http://127.0.0.1:8545)
    pub rpc_url: String,

    /// Mentorium contract address (0x-prefixed, 20 bytes)
    pub contract_address: String,

    /// Address of the locally-held account, for headless sessions
    /// (the debugger) that have no browser wallet to ask.
    pub wallet_address: Option<String>,

    /// Secret key of the locally-held account (0x-prefixed, 32 bytes)
    pub wallet_secret_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Interval between event poll rounds, in seconds
    pub poll_interval_secs: u64,

    /// How many confirmation polls a write waits before giving up
    pub confirm_attempts: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `CONTRACT_ADDRESS`: Mentorium contract address
    ///
    /// Optional variables (with defaults):
    /// - `RPC_URL`: ledger JSON-RPC endpoint (defaults to a local node)
    /// - `WALLET_ADDRESS` / `WALLET_SECRET_KEY`: headless account
    /// - `TIMEOUT_SECS`: request timeout (defaults to 30)
    /// - `POLL_INTERVAL_SECS`: event poll interval (defaults to 5)
    /// - `CONFIRM_ATTEMPTS`: confirmation poll limit (defaults to 30)
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            rpc_url: env_var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string()),

            contract_address: env_var("CONTRACT_ADDRESS")?,

            wallet_address: env_var("WALLET_ADDRESS").ok(),

            wallet_secret_key: env_var("WALLET_SECRET_KEY").ok(),

            timeout_secs: env_var("TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| GatewayError::Config("Invalid TIMEOUT_SECS".to_string()))?,

            poll_interval_secs: env_var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| GatewayError::Config("Invalid POLL_INTERVAL_SECS".to_string()))?,

            confirm_attempts: env_var("CONFIRM_ATTEMPTS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| GatewayError::Config("Invalid CONFIRM_ATTEMPTS".to_string()))?,
        })
    }

    /// Validate that all required configuration is present and well-formed.
    pub fn validate(&self) -> Result<()> {
        if !is_hex_address(&self.contract_address) {
            return Err(GatewayError::Config(
                "CONTRACT_ADDRESS must be a 0x-prefixed 20-byte hex address".to_string(),
            ));
        }

        if let Some(address) = &self.wallet_address {
            if !is_hex_address(address) {
                return Err(GatewayError::Config(
                    "WALLET_ADDRESS must be a 0x-prefixed 20-byte hex address".to_string(),
                ));
            }
        }

        if let Some(key) = &self.wallet_secret_key {
            if !is_hex_bytes(key, 32) {
                return Err(GatewayError::Config(
                    "WALLET_SECRET_KEY must be a 0x-prefixed 32-byte hex string".to_string(),
                ));
            }
        }

        if !self.rpc_url.starts_with("http") {
            return Err(GatewayError::Config(
                "RPC_URL must be a valid HTTP(S) URL".to_string(),
            ));
        }

        Ok(())
    }
}

/// Check for a 0x-prefixed hex string encoding exactly `len` bytes.
fn is_hex_bytes(value: &str, len: usize) -> bool {
    value
        .strip_prefix("0x")
        .and_then(|body| hex::decode(body).ok())
        .map(|bytes| bytes.len() == len)
        .unwrap_or(false)
}

fn is_hex_address(value: &str) -> bool {
    is_hex_bytes(value, 20)
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| GatewayError::Config(format!("Missing required environment variable: {key}")))
}
