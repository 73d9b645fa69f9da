//! # Mentorium Ledger Gateway
//!
//! Typed façade over the Mentorium tutoring-marketplace contract.
//! The contract is the source of truth for roles, token balances,
//! tutoring offers, and the tutoring history; this crate translates
//! application calls into ledger invocations and forwards ledger
//! notifications back out, holding no business state of its own.
//!
//! | Concern        | Module                                   |
//! |----------------|------------------------------------------|
//! | Typed ops      | [`gateway`] ([`Gateway`])                |
//! | Wire transport | [`rpc`] ([`HttpTransport`])              |
//! | Wallet seam    | [`wallet`] ([`WalletProvider`])          |
//! | Notifications  | [`events`] (subscription hub + poller)   |
//! | Domain model   | [`types`]                                |
//!
//! Reads fail soft (defaulting to zero/empty/`None`), writes fail loud
//! and wait for on-ledger confirmation. See the module docs for the
//! rationale behind each.

pub mod config;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod rpc;
pub mod types;
pub mod wallet;

pub use config::Config;
pub use errors::{GatewayError, Result};
pub use events::{EventHandler, EventHub};
pub use gateway::Gateway;
pub use rpc::{CallRequest, EventPage, HttpTransport, LedgerTransport, SharedTransport};
pub use types::{
    EventTopic, LedgerEvent, Role, SessionStatus, TutoringOffer, TutoringRecord,
};
pub use wallet::{KeyWallet, WalletProvider};
