//! In-memory ledger double for view-state tests.
//!
//! Implements the transport seam with a tiny working model of the
//! contract, so tests can exercise real read-after-write flows instead
//! of asserting against canned responses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mentorium_gateway::rpc::{CallRequest, EventPage, LedgerTransport};
use mentorium_gateway::{Gateway, GatewayError, KeyWallet};
use serde_json::{json, Value};

use crate::App;

#[derive(Debug, Clone)]
pub struct FakeOffer {
    pub tutor: String,
    pub subject: String,
    pub price: u64,
    pub active: bool,
    pub timestamp: u64,
}

#[derive(Debug, Clone)]
pub struct FakeTutoria {
    pub student: String,
    pub tutor: String,
    pub subject: String,
    pub tokens: u64,
    pub timestamp: u64,
}

#[derive(Debug, Default)]
pub struct LedgerData {
    pub owner: String,
    pub roles: HashMap<String, u64>,
    pub balances: HashMap<String, u64>,
    pub offers: Vec<FakeOffer>,
    pub tutorias: Vec<FakeTutoria>,
}

#[derive(Default)]
pub struct FakeLedger {
    pub data: Mutex<LedgerData>,
    pub calls: Mutex<Vec<String>>,
    pub fail_reads: AtomicBool,
    pub reject_with: Mutex<Option<String>>,
}

/// Address keys are normalized the way a real node does, so mixed-case
/// inputs hit the same account.
fn norm(address: &str) -> String {
    address.to_ascii_lowercase()
}

impl FakeLedger {
    /// Ledger with one account holding `role` and `balance`.
    pub fn with_account(address: &str, role: u64, balance: u64) -> Arc<Self> {
        let ledger = FakeLedger::default();
        {
            let mut data = ledger.data.lock().unwrap();
            data.owner = "0xdead".to_string();
            data.roles.insert(norm(address), role);
            data.balances.insert(norm(address), balance);
        }
        Arc::new(ledger)
    }

    pub fn add_offer(&self, tutor: &str, subject: &str, price: u64) {
        self.data.lock().unwrap().offers.push(FakeOffer {
            tutor: tutor.to_string(),
            subject: subject.to_string(),
            price,
            active: true,
            timestamp: 1_700_000_000,
        });
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn reject_writes(&self, reason: &str) {
        *self.reject_with.lock().unwrap() = Some(reason.to_string());
    }

    pub fn accept_writes(&self) {
        *self.reject_with.lock().unwrap() = None;
    }
}

fn offer_json(offer: &FakeOffer) -> Value {
    json!({
        "tutor": offer.tutor,
        "materia": offer.subject,
        "precio": offer.price,
        "activa": offer.active,
        "timestamp": offer.timestamp,
    })
}

fn arg_str(request: &CallRequest, index: usize) -> String {
    request.args[index].as_str().unwrap_or_default().to_string()
}

fn arg_u64(request: &CallRequest, index: usize) -> u64 {
    request.args[index].as_u64().unwrap_or_default()
}

#[async_trait]
impl LedgerTransport for FakeLedger {
    async fn call(&self, request: &CallRequest) -> mentorium_gateway::Result<Value> {
        self.calls.lock().unwrap().push(request.function.to_string());
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(GatewayError::Network("simulated outage".to_string()));
        }

        let data = self.data.lock().unwrap();
        let value = match request.function {
            "owner" => json!(data.owner),
            "roles" => json!(data.roles.get(&norm(&arg_str(request, 0))).copied().unwrap_or(0)),
            "getBalance" | "balances" => {
                json!(data
                    .balances
                    .get(&norm(&arg_str(request, 0)))
                    .copied()
                    .unwrap_or(0))
            }
            "getNumeroOfertas" => json!(data.offers.len()),
            "getOferta" => {
                let id = arg_u64(request, 0) as usize;
                match data.offers.get(id) {
                    Some(offer) => offer_json(offer),
                    None => {
                        return Err(GatewayError::TransactionRejected(
                            "offer not found".to_string(),
                        ))
                    }
                }
            }
            "getOfertasActivas" => {
                json!(data
                    .offers
                    .iter()
                    .filter(|offer| offer.active)
                    .map(offer_json)
                    .collect::<Vec<_>>())
            }
            "getOfertasPorTutor" => {
                let tutor = arg_str(request, 0);
                json!(data
                    .offers
                    .iter()
                    .enumerate()
                    .filter(|(_, offer)| offer.tutor == tutor)
                    .map(|(id, _)| id as u64)
                    .collect::<Vec<_>>())
            }
            "getTutorias" => {
                json!(data
                    .tutorias
                    .iter()
                    .map(|t| {
                        json!({
                            "estudiante": t.student,
                            "tutor": t.tutor,
                            "materia": t.subject,
                            "tokens": t.tokens,
                            "timestamp": t.timestamp,
                        })
                    })
                    .collect::<Vec<_>>())
            }
            other => {
                return Err(GatewayError::Network(format!("unscripted read: {other}")))
            }
        };
        Ok(value)
    }

    async fn submit(&self, request: &CallRequest) -> mentorium_gateway::Result<String> {
        self.calls.lock().unwrap().push(request.function.to_string());
        if let Some(reason) = self.reject_with.lock().unwrap().clone() {
            return Err(GatewayError::TransactionRejected(reason));
        }
        let source = request
            .source
            .clone()
            .ok_or(GatewayError::NotConnected)?;

        let mut data = self.data.lock().unwrap();
        match request.function {
            "crearOfertaTutoria" => {
                let offer = FakeOffer {
                    tutor: source,
                    subject: arg_str(request, 0),
                    price: arg_u64(request, 1),
                    active: true,
                    timestamp: 1_700_000_000,
                };
                data.offers.push(offer);
            }
            "cancelarOfertaTutoria" => {
                let id = arg_u64(request, 0) as usize;
                if let Some(offer) = data.offers.get_mut(id) {
                    offer.active = false;
                }
            }
            "requestTutoring" => {
                let id = arg_u64(request, 0) as usize;
                let offer = data.offers[id].clone();
                let paid = offer.price;
                let have = data.balances.get(&norm(&source)).copied().unwrap_or(0);
                if have < paid {
                    return Err(GatewayError::TransactionRejected(
                        "insufficient balance".to_string(),
                    ));
                }
                data.balances.insert(norm(&source), have - paid);
                *data.balances.entry(norm(&offer.tutor)).or_insert(0) += paid;
                data.tutorias.push(FakeTutoria {
                    student: source,
                    tutor: offer.tutor,
                    subject: offer.subject,
                    tokens: paid,
                    timestamp: 1_700_000_100,
                });
            }
            "assignTokens" => {
                let to = norm(&arg_str(request, 0));
                *data.balances.entry(to).or_insert(0) += arg_u64(request, 1);
            }
            "setRole" => {
                let target = norm(&arg_str(request, 0));
                let role = arg_u64(request, 1);
                data.roles.insert(target, role);
            }
            "redeemTokens" => {
                // The contract burns the redeemer's tokens.
                data.balances.insert(norm(&source), 0);
            }
            other => {
                return Err(GatewayError::TransactionRejected(format!(
                    "unscripted write: {other}"
                )))
            }
        }
        Ok("0xfeed".to_string())
    }

    async fn events(&self, _cursor: u64) -> mentorium_gateway::Result<EventPage> {
        Ok(EventPage::default())
    }
}

/// Build an [`App`] over `ledger` and connect it as `address`.
pub async fn connected_app(ledger: Arc<FakeLedger>, address: &str) -> Arc<App> {
    let gateway = Arc::new(Gateway::new(
        ledger,
        Some(Arc::new(KeyWallet::new(address))),
    ));
    let app = Arc::new(App::new(gateway));
    app.connect().await.expect("connect failed");
    app
}
