//! Error types for the Ledger Gateway.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("No wallet provider is available in this session")]
    WalletUnavailable,

    #[error("Wallet provider returned no accounts")]
    NoAccounts,

    #[error("No account connected; call connect() first")]
    NotConnected,

    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
