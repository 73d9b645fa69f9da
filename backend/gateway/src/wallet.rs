//! Wallet provider boundary.
//!
//! The wallet is an injected capability, never created by the gateway:
//! browser sessions hand in the page's provider, headless sessions (the
//! debugger) use a key configured through the environment.

use async_trait::async_trait;

use crate::config::Config;
use crate::errors::{GatewayError, Result};

/// Account-selection capability. Transaction signing stays on the
/// provider's side of the boundary; the gateway only names the source
/// account when it submits.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the provider for the accounts it is willing to expose.
    async fn request_accounts(&self) -> Result<Vec<String>>;
}

/// Single-account wallet backed by a locally-held key, for sessions
/// without a browser provider.
pub struct KeyWallet {
    address: String,
}

impl KeyWallet {
    pub fn new(address: impl Into<String>) -> Self {
        KeyWallet {
            address: address.into(),
        }
    }

    /// Build from `WALLET_ADDRESS` in the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let address = config.wallet_address.clone().ok_or_else(|| {
            GatewayError::Config("WALLET_ADDRESS is required for a headless session".to_string())
        })?;
        Ok(KeyWallet::new(address))
    }
}

#[async_trait]
impl WalletProvider for KeyWallet {
    async fn request_accounts(&self) -> Result<Vec<String>> {
        Ok(vec![self.address.clone()])
    }
}
