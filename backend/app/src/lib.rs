//! # Mentorium View State
//!
//! The observable state container behind the Mentorium dashboard. It
//! owns the only in-memory copies of wallet, role, offer, and history
//! data; the ledger stays the source of truth and is re-queried through
//! the gateway whenever local state could have gone stale.
//!
//! Presentation code calls the named operations on [`App`] and renders
//! the [`AppState`] snapshots; it never talks to the ledger directly.

pub mod app;
pub mod errors;
pub mod state;

pub use app::App;
pub use errors::{AppError, Result};
pub use state::{AppState, User, WalletConnection};

#[cfg(test)]
mod test_utils;
