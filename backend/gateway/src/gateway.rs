//! The Ledger Gateway.
//!
//! Stateless façade translating typed application calls into contract
//! invocations. Holds only connection handles: the transport, the wallet
//! capability, and the active account. No business state lives here.
//!
//! Failure policy: reads fail soft (log and return a zero/empty default
//! so the UI survives transient connectivity loss); writes fail loud so
//! callers never assume a rejected transaction landed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::errors::{GatewayError, Result};
use crate::events::{spawn_poller, EventHandler, EventHub};
use crate::rpc::{CallRequest, SharedTransport};
use crate::types::{EventTopic, Role, TutoringOffer, TutoringRecord, WireOffer, WireRecord};
use crate::wallet::WalletProvider;
use tokio_util::sync::CancellationToken;

pub struct Gateway {
    transport: SharedTransport,
    wallet: Option<Arc<dyn WalletProvider>>,
    account: Mutex<Option<String>>,
    hub: EventHub,
}

impl Gateway {
    /// Build a gateway for one session. The wallet is `None` when no
    /// provider is present in the environment.
    pub fn new(transport: SharedTransport, wallet: Option<Arc<dyn WalletProvider>>) -> Self {
        Gateway {
            transport,
            wallet,
            account: Mutex::new(None),
            hub: EventHub::new(),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Connection
    // ─────────────────────────────────────────────────────────

    /// Request account access and return the active address with its
    /// current token balance. The caller fetches the role separately.
    pub async fn connect(&self) -> Result<(String, u64)> {
        let wallet = self.wallet.as_ref().ok_or(GatewayError::WalletUnavailable)?;

        let accounts = wallet.request_accounts().await?;
        let address = accounts
            .into_iter()
            .next()
            .ok_or(GatewayError::NoAccounts)?;

        {
            let mut account = self.account.lock().expect("account lock poisoned");
            *account = Some(address.clone());
        }

        let balance = self.balance_of(&address).await;
        info!(%address, balance, "wallet connected");
        Ok((address, balance))
    }

    /// The connected account, if any.
    pub fn account(&self) -> Option<String> {
        self.account.lock().expect("account lock poisoned").clone()
    }

    // ─────────────────────────────────────────────────────────
    // Reads (fail soft)
    // ─────────────────────────────────────────────────────────

    async fn read(&self, function: &'static str, args: Vec<Value>) -> Option<Value> {
        match self.transport.call(&CallRequest::read(function, args)).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(function, error = %e, "ledger read failed, returning default");
                None
            }
        }
    }

    /// Contract owner address, `None` if the read fails.
    pub async fn owner(&self) -> Option<String> {
        self.read("owner", vec![])
            .await
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// Role stored for `address`. A failed read is indistinguishable
    /// from a genuinely unassigned address; both come back `None`.
    pub async fn role_of(&self, address: &str) -> Role {
        let ordinal = self
            .read("roles", vec![json!(address)])
            .await
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        Role::from_ordinal(ordinal)
    }

    /// Token balance via the contract's `getBalance` accessor.
    pub async fn balance_of(&self, address: &str) -> u64 {
        self.read("getBalance", vec![json!(address)])
            .await
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    /// Balance read straight from the `balances` storage map. The
    /// debugger compares this against [`Gateway::balance_of`] to spot
    /// accessor/storage discrepancies.
    pub async fn stored_balance_of(&self, address: &str) -> u64 {
        self.read("balances", vec![json!(address)])
            .await
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    /// Total number of offers ever created (active or not).
    pub async fn offer_count(&self) -> u64 {
        self.read("getNumeroOfertas", vec![])
            .await
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    /// One offer by its storage index.
    pub async fn offer(&self, id: u64) -> Option<TutoringOffer> {
        let value = self.read("getOferta", vec![json!(id)]).await?;
        match serde_json::from_value::<WireOffer>(value) {
            Ok(wire) => Some(wire.into_offer(id)),
            Err(e) => {
                warn!(id, error = %e, "malformed offer tuple");
                None
            }
        }
    }

    /// All currently-active offers, each tagged with its stable storage
    /// index. `getOfertasActivas` returns the tuples without indices, so
    /// the listing is built by enumerating storage instead.
    pub async fn active_offers(&self) -> Vec<TutoringOffer> {
        let count = self.offer_count().await;
        let mut offers = Vec::new();
        for id in 0..count {
            if let Some(offer) = self.offer(id).await {
                if offer.active {
                    offers.push(offer);
                }
            }
        }
        offers
    }

    /// How many offers the contract's own active view reports. Used by
    /// the debugger to cross-check [`Gateway::active_offers`].
    pub async fn ledger_active_offer_count(&self) -> u64 {
        self.read("getOfertasActivas", vec![])
            .await
            .and_then(|v| v.as_array().map(|a| a.len() as u64))
            .unwrap_or(0)
    }

    /// Storage indices of every offer published by `tutor`.
    pub async fn offers_by_tutor(&self, tutor: &str) -> Vec<u64> {
        self.read("getOfertasPorTutor", vec![json!(tutor)])
            .await
            .and_then(|v| serde_json::from_value::<Vec<u64>>(v).ok())
            .unwrap_or_default()
    }

    /// The full global tutoring history. Callers filter by participant.
    pub async fn tutoring_records(&self) -> Vec<TutoringRecord> {
        self.read("getTutorias", vec![])
            .await
            .and_then(|v| serde_json::from_value::<Vec<WireRecord>>(v).ok())
            .map(|wires| wires.into_iter().map(TutoringRecord::from).collect())
            .unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────
    // Writes (fail loud, confirmed before returning)
    // ─────────────────────────────────────────────────────────

    async fn write(&self, function: &'static str, args: Vec<Value>) -> Result<String> {
        let source = self.account().ok_or(GatewayError::NotConnected)?;
        let request = CallRequest {
            function,
            args,
            source: Some(source),
        };
        let hash = self.transport.submit(&request).await?;
        info!(function, %hash, "transaction confirmed");
        Ok(hash)
    }

    pub async fn create_offer(&self, subject: &str, price: u64) -> Result<String> {
        self.write("crearOfertaTutoria", vec![json!(subject), json!(price)])
            .await
    }

    pub async fn cancel_offer(&self, id: u64) -> Result<String> {
        self.write("cancelarOfertaTutoria", vec![json!(id)]).await
    }

    pub async fn request_tutoring(&self, offer_id: u64) -> Result<String> {
        self.write("requestTutoring", vec![json!(offer_id)]).await
    }

    pub async fn assign_tokens(&self, to: &str, amount: u64) -> Result<String> {
        self.write("assignTokens", vec![json!(to), json!(amount)])
            .await
    }

    pub async fn set_role(&self, address: &str, role: Role) -> Result<String> {
        self.write("setRole", vec![json!(address), json!(role.as_ordinal())])
            .await
    }

    pub async fn redeem_tokens(&self, benefit: &str) -> Result<String> {
        self.write("redeemTokens", vec![json!(benefit)]).await
    }

    // ─────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────

    /// Register a push handler for `topic`. Subscriptions are additive.
    pub fn subscribe(&self, topic: EventTopic, handler: EventHandler) {
        self.hub.subscribe(topic, handler);
    }

    /// Drop every registered handler.
    pub fn unsubscribe_all(&self) {
        self.hub.unsubscribe_all();
    }

    /// Start polling the ledger for notifications. Returns the token
    /// that stops the poller when cancelled.
    pub fn start_event_poller(&self, interval: Duration) -> CancellationToken {
        spawn_poller(self.hub.clone(), Arc::clone(&self.transport), interval)
    }
}
