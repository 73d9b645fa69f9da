//! Event subscription hub and ledger notification poller.
//!
//! The hub only forwards decoded notifications to registered handlers;
//! deciding what to refresh is the view-state layer's job.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::rpc::SharedTransport;
use crate::types::{EventTopic, LedgerEvent};

pub type EventHandler = Box<dyn Fn(&LedgerEvent) + Send + Sync>;

/// Per-topic handler registry. Subscriptions are additive; a topic may
/// hold any number of handlers.
#[derive(Clone, Default)]
pub struct EventHub {
    handlers: Arc<Mutex<HashMap<EventTopic, Vec<EventHandler>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: EventTopic, handler: EventHandler) {
        let mut handlers = self.handlers.lock().expect("event hub lock poisoned");
        handlers.entry(topic).or_default().push(handler);
    }

    /// Drop every registered handler. Safe to call when none are
    /// registered.
    pub fn unsubscribe_all(&self) {
        let mut handlers = self.handlers.lock().expect("event hub lock poisoned");
        handlers.clear();
    }

    pub fn dispatch(&self, event: &LedgerEvent) {
        let handlers = self.handlers.lock().expect("event hub lock poisoned");
        if let Some(registered) = handlers.get(&event.topic()) {
            for handler in registered {
                handler(event);
            }
        }
    }

    #[cfg(test)]
    fn handler_count(&self, topic: EventTopic) -> usize {
        let handlers = self.handlers.lock().expect("event hub lock poisoned");
        handlers.get(&topic).map(Vec::len).unwrap_or(0)
    }
}

/// Spawn the background task that polls `getEvents` and feeds the hub.
///
/// The cursor only advances, so a notification is dispatched at most
/// once per poller. Poll failures are logged and retried next round;
/// individual events that fail to decode are skipped.
pub fn spawn_poller(
    hub: EventHub,
    transport: SharedTransport,
    interval: Duration,
) -> CancellationToken {
    let token = CancellationToken::new();
    let poller_token = token.clone();

    tokio::spawn(async move {
        let mut cursor = 0u64;
        loop {
            tokio::select! {
                _ = poller_token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {
                    match transport.events(cursor).await {
                        Ok(page) => {
                            cursor = page.cursor;
                            for raw in page.events {
                                match serde_json::from_value::<LedgerEvent>(raw) {
                                    Ok(event) => hub.dispatch(&event),
                                    Err(e) => debug!(error = %e, "skipping undecodable event"),
                                }
                            }
                        }
                        Err(e) => warn!(error = %e, "event poll failed, will retry"),
                    }
                }
            }
        }
        debug!("event poller stopped");
    });

    token
}
