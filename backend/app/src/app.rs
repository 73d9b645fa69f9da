//! The synchronized view-state component.
//!
//! Owns the single in-memory snapshot the dashboard renders and keeps
//! it eventually consistent with the ledger through the gateway. Every
//! transition is a whole-snapshot replacement, so readers never observe
//! a torn state. Conflicting writes on the same logical resource
//! (account, offers, history) queue behind a per-resource mutex rather
//! than interleave; reads are never blocked.

use std::sync::Arc;

use mentorium_gateway::{EventTopic, Gateway, LedgerEvent, Role};
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, warn};

use crate::errors::{AppError, Result};
use crate::state::{AppState, User, WalletConnection};

pub struct App {
    gateway: Arc<Gateway>,
    state: RwLock<AppState>,
    // Lock order when an operation spans resources:
    // account before offers before history.
    account_guard: Mutex<()>,
    offers_guard: Mutex<()>,
    history_guard: Mutex<()>,
}

impl App {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        App {
            gateway,
            state: RwLock::new(AppState::default()),
            account_guard: Mutex::new(()),
            offers_guard: Mutex::new(()),
            history_guard: Mutex::new(()),
        }
    }

    /// Current snapshot. Cheap clone; presentation code is strictly
    /// read-only against it.
    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }

    // ─────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────

    /// Connect the wallet, then derive the user's role with a single
    /// ledger read. On failure the wallet stays disconnected.
    pub async fn connect(&self) -> Result<()> {
        let _guard = self.account_guard.lock().await;
        self.begin().await;
        let result = async {
            let (address, balance) = self.gateway.connect().await?;
            let role = self.gateway.role_of(&address).await;
            self.mutate(|state| {
                state.wallet = WalletConnection {
                    connected: true,
                    address: Some(address.clone()),
                    balance,
                };
                state.user = Some(User {
                    address: address.clone(),
                    role,
                });
            })
            .await;
            Ok(())
        }
        .await;
        self.finish(result).await
    }

    /// Re-read the connected account's role; touches nothing else.
    pub async fn refresh_role(&self) -> Result<()> {
        let _guard = self.account_guard.lock().await;
        self.begin().await;
        let result = async {
            let address = self.connected_address().await?;
            self.sync_role(&address).await;
            Ok(())
        }
        .await;
        self.finish(result).await
    }

    /// Re-read the connected account's balance; touches nothing else.
    pub async fn refresh_balance(&self) -> Result<()> {
        let _guard = self.account_guard.lock().await;
        self.begin().await;
        let result = async {
            let address = self.connected_address().await?;
            self.sync_balance(&address).await;
            Ok(())
        }
        .await;
        self.finish(result).await
    }

    /// Replace the offers list with the ledger's current active set.
    pub async fn load_offers(&self) -> Result<()> {
        let _guard = self.offers_guard.lock().await;
        self.begin().await;
        self.sync_offers().await;
        self.finish(Ok(())).await
    }

    /// Replace the history with the ledger records involving the
    /// connected account.
    pub async fn load_history(&self) -> Result<()> {
        let _guard = self.history_guard.lock().await;
        self.begin().await;
        let result = async {
            let address = self.connected_address().await?;
            self.sync_history(&address).await;
            Ok(())
        }
        .await;
        self.finish(result).await
    }

    /// Publish a new offer. Input is validated locally; invalid input
    /// never reaches the ledger. On confirmation the whole offers list
    /// is re-fetched rather than merged, so local state cannot drift
    /// from ledger truth.
    pub async fn create_offer(&self, subject: &str, price: u64) -> Result<()> {
        let _guard = self.offers_guard.lock().await;
        self.begin().await;
        let result = async {
            let subject = subject.trim();
            if subject.is_empty() {
                return Err(AppError::InvalidOffer("subject must not be empty".to_string()));
            }
            if price == 0 {
                return Err(AppError::InvalidOffer("price must be positive".to_string()));
            }
            self.gateway.create_offer(subject, price).await?;
            self.sync_offers().await;
            Ok(())
        }
        .await;
        self.finish(result).await
    }

    /// Cancel an offer. On confirmation the offer is removed from local
    /// state directly; the ledger operation is narrow and idempotent to
    /// re-apply, so this is the one place an incremental update is used.
    pub async fn cancel_offer(&self, id: u64) -> Result<()> {
        let _guard = self.offers_guard.lock().await;
        self.begin().await;
        let result = async {
            self.gateway.cancel_offer(id).await?;
            self.mutate(|state| state.offers.retain(|offer| offer.id != id))
                .await;
            Ok(())
        }
        .await;
        self.finish(result).await
    }

    /// Pay for a tutoring offer. The balance precondition is checked
    /// against local state before any ledger call; on confirmation both
    /// balance and history are re-fetched in full.
    pub async fn request_tutoring(&self, offer_id: u64) -> Result<()> {
        let _account = self.account_guard.lock().await;
        let _history = self.history_guard.lock().await;
        self.begin().await;
        let result = async {
            let (address, have, need) = {
                let state = self.state.read().await;
                let address = state
                    .wallet
                    .address
                    .clone()
                    .ok_or(AppError::NotConnected)?;
                let offer = state
                    .offers
                    .iter()
                    .find(|offer| offer.id == offer_id)
                    .ok_or(AppError::OfferNotFound(offer_id))?;
                (address, state.wallet.balance, offer.price)
            };
            if have < need {
                return Err(AppError::InsufficientBalance { have, need });
            }
            self.gateway.request_tutoring(offer_id).await?;
            self.sync_balance(&address).await;
            self.sync_history(&address).await;
            Ok(())
        }
        .await;
        self.finish(result).await
    }

    /// Assign tokens to an address. If the target is the connected
    /// account, the balance is re-read from the ledger afterwards (not
    /// incremented locally: another mutation may have landed too).
    pub async fn assign_tokens(&self, to: &str, amount: u64) -> Result<()> {
        let _guard = self.account_guard.lock().await;
        self.begin().await;
        let result = async {
            self.gateway.assign_tokens(to, amount).await?;
            if let Some(address) = self.connected_if_same(to).await {
                self.sync_balance(&address).await;
            }
            Ok(())
        }
        .await;
        self.finish(result).await
    }

    /// Set an address's role. Refreshes the local role only when the
    /// target is the connected account.
    pub async fn set_role(&self, address: &str, role: Role) -> Result<()> {
        let _guard = self.account_guard.lock().await;
        self.begin().await;
        let result = async {
            self.gateway.set_role(address, role).await?;
            if let Some(own) = self.connected_if_same(address).await {
                self.sync_role(&own).await;
            }
            Ok(())
        }
        .await;
        self.finish(result).await
    }

    /// Redeem tokens for a benefit, then re-read the balance.
    pub async fn redeem_tokens(&self, benefit: &str) -> Result<()> {
        let _guard = self.account_guard.lock().await;
        self.begin().await;
        let result = async {
            self.gateway.redeem_tokens(benefit).await?;
            let address = self.connected_address().await?;
            self.sync_balance(&address).await;
            Ok(())
        }
        .await;
        self.finish(result).await
    }

    // ─────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────

    /// React to a ledger notification. Handlers are idempotent
    /// re-readers: each triggers the same refresh routine as the
    /// corresponding local operation, filtered to the connected account
    /// where the notification is account-scoped.
    pub async fn handle_event(&self, event: LedgerEvent) {
        debug!(?event, "handling ledger notification");
        let outcome = match event {
            LedgerEvent::TokensAssigned { ref to, .. } => {
                if self.connected_if_same(to).await.is_some() {
                    self.refresh_balance().await
                } else {
                    Ok(())
                }
            }
            // Offers are not account-scoped: always re-fetch the list.
            LedgerEvent::OfferCreated { .. } => self.load_offers().await,
            LedgerEvent::OfferCancelled { offer_id, .. } => {
                let _guard = self.offers_guard.lock().await;
                self.mutate(|state| state.offers.retain(|offer| offer.id != offer_id))
                    .await;
                Ok(())
            }
            LedgerEvent::TutoringPaid {
                ref from, ref to, ..
            } => {
                let involved = self.connected_if_same(from).await.is_some()
                    || self.connected_if_same(to).await.is_some();
                if involved {
                    match self.refresh_balance().await {
                        Ok(()) => self.load_history().await,
                        Err(e) => Err(e),
                    }
                } else {
                    Ok(())
                }
            }
            LedgerEvent::TokensRedeemed { ref user, .. } => {
                if self.connected_if_same(user).await.is_some() {
                    self.refresh_balance().await
                } else {
                    Ok(())
                }
            }
        };

        if let Err(e) = outcome {
            warn!(error = %e, "notification refresh failed");
        }
    }

    /// Wire the gateway's subscription hub to this component. Raw
    /// notifications flow through a channel into a dispatcher task, so
    /// the gateway never mutates state directly.
    pub fn attach_subscriptions(self: &Arc<Self>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<LedgerEvent>();

        for topic in EventTopic::ALL {
            let tx = tx.clone();
            self.gateway.subscribe(
                topic,
                Box::new(move |event| {
                    let _ = tx.send(event.clone());
                }),
            );
        }

        let app = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                app.handle_event(event).await;
            }
        });
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    // ─────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────

    /// Replace the snapshot in one step.
    async fn mutate<F: FnOnce(&mut AppState)>(&self, apply: F) {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        apply(&mut next);
        *state = next;
    }

    async fn begin(&self) {
        self.mutate(|state| state.pending = true).await;
    }

    /// Store the outcome: success clears `last_error`, failure records
    /// it. `pending` always clears last.
    async fn finish<T>(&self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => {
                self.mutate(|state| {
                    state.last_error = None;
                    state.pending = false;
                })
                .await;
            }
            Err(e) => {
                let message = e.to_string();
                self.mutate(move |state| {
                    state.last_error = Some(message);
                    state.pending = false;
                })
                .await;
            }
        }
        result
    }

    async fn connected_address(&self) -> Result<String> {
        self.state
            .read()
            .await
            .wallet
            .address
            .clone()
            .ok_or(AppError::NotConnected)
    }

    /// The connected address, if it equals `other` (addresses compare
    /// case-insensitively).
    async fn connected_if_same(&self, other: &str) -> Option<String> {
        let state = self.state.read().await;
        state
            .wallet
            .address
            .as_ref()
            .filter(|address| address.eq_ignore_ascii_case(other))
            .cloned()
    }

    async fn sync_role(&self, address: &str) {
        let role = self.gateway.role_of(address).await;
        self.mutate(|state| {
            if let Some(user) = &mut state.user {
                user.role = role;
            }
        })
        .await;
    }

    async fn sync_balance(&self, address: &str) {
        let balance = self.gateway.balance_of(address).await;
        self.mutate(|state| state.wallet.balance = balance).await;
    }

    async fn sync_offers(&self) {
        let offers = self.gateway.active_offers().await;
        self.mutate(|state| state.offers = offers).await;
    }

    async fn sync_history(&self, address: &str) {
        let records = self.gateway.tutoring_records().await;
        let history = records
            .into_iter()
            .filter(|record| {
                record.student.eq_ignore_ascii_case(address)
                    || record.tutor.eq_ignore_ascii_case(address)
            })
            .collect();
        self.mutate(|state| state.history = history).await;
    }
}
