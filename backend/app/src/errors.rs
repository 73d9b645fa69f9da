//! Error types for the view-state layer.

use mentorium_gateway::GatewayError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Local precondition failure: the operation never reached the ledger.
    #[error("Insufficient balance: have {have} tokens, need {need}")]
    InsufficientBalance { have: u64, need: u64 },

    #[error("Invalid offer: {0}")]
    InvalidOffer(String),

    #[error("No offer with id {0} in the current listing")]
    OfferNotFound(u64),

    #[error("No wallet connected")]
    NotConnected,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
