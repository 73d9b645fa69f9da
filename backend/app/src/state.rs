//! The state snapshot consumed by the presentation layer.

use mentorium_gateway::{Role, TutoringOffer, TutoringRecord};
use serde::Serialize;

/// Local knowledge of the connected account.
///
/// Invariant: `address` is `Some` iff `connected` is true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalletConnection {
    pub connected: bool,
    pub address: Option<String>,
    pub balance: u64,
}

/// Derived identity for the connected account. The role always comes
/// from the last successful ledger read, never invented locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub address: String,
    pub role: Role,
}

/// One immutable snapshot of everything the dashboard renders.
/// Replaced wholesale on every transition; never partially updated in
/// place where a reader could observe it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppState {
    pub wallet: WalletConnection,
    pub user: Option<User>,
    pub offers: Vec<TutoringOffer>,
    pub history: Vec<TutoringRecord>,
    pub pending: bool,
    pub last_error: Option<String>,
}
