//! Ledger JSON-RPC transport.
//!
//! Builds and submits contract invocations against the ledger node.
//! Reads run as simulations; writes simulate first to catch contract
//! errors, then send and poll until the transaction is confirmed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{GatewayError, Result};

/// One contract invocation, read or write.
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Contract function name, exactly as the interface defines it.
    pub function: &'static str,
    pub args: Vec<Value>,
    /// Sending account for writes; `None` for reads.
    pub source: Option<String>,
}

impl CallRequest {
    pub fn read(function: &'static str, args: Vec<Value>) -> Self {
        CallRequest {
            function,
            args,
            source: None,
        }
    }
}

/// One page of ledger notifications, plus the cursor to resume from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPage {
    pub events: Vec<Value>,
    pub cursor: u64,
}

/// The wire the gateway talks through. Injectable so tests can script
/// ledger behavior without a node.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Execute a read-only invocation and return its decoded return value.
    async fn call(&self, request: &CallRequest) -> Result<Value>;

    /// Submit a state-changing invocation, wait for on-ledger
    /// confirmation, and return the transaction hash.
    async fn submit(&self, request: &CallRequest) -> Result<String>;

    /// Fetch notifications emitted after `cursor`.
    async fn events(&self, cursor: u64) -> Result<EventPage>;
}

pub type SharedTransport = Arc<dyn LedgerTransport>;

/// JSON-RPC transport over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    rpc_url: String,
    contract_address: String,
    confirm_attempts: u32,
    confirm_interval: Duration,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(HttpTransport {
            client,
            rpc_url: config.rpc_url.clone(),
            contract_address: config.contract_address.clone(),
            confirm_attempts: config.confirm_attempts,
            confirm_interval: Duration::from_secs(1),
        })
    }

    fn invocation_params(&self, request: &CallRequest) -> Value {
        json!({
            "contractAddress": self.contract_address,
            "function": request.function,
            "args": request.args,
            "source": request.source,
        })
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("{method} request failed: {e}")))?;

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to parse {method} response: {e}")))?;

        debug!(method, response = %response_json, "rpc round trip");

        if let Some(error) = response_json.get("error") {
            return Err(GatewayError::Network(format!("{method} failed: {error}")));
        }

        Ok(response_json.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Run a simulation and surface any contract error it reports.
    async fn simulate(&self, request: &CallRequest) -> Result<Value> {
        let result = self
            .rpc("simulateTransaction", self.invocation_params(request))
            .await?;

        if let Some(error) = result.get("error") {
            return Err(GatewayError::TransactionRejected(ledger_reason(error)));
        }

        Ok(result)
    }

    /// Poll `getTransaction` until the ledger reports a final status.
    async fn wait_for_confirmation(&self, hash: &str) -> Result<()> {
        for _ in 0..self.confirm_attempts {
            let result = self.rpc("getTransaction", json!({ "hash": hash })).await?;

            match result.get("status").and_then(Value::as_str) {
                Some("SUCCESS") => return Ok(()),
                Some("FAILED") => {
                    let reason = result
                        .get("error")
                        .map(ledger_reason)
                        .unwrap_or_else(|| "transaction failed on ledger".to_string());
                    return Err(GatewayError::TransactionRejected(reason));
                }
                _ => tokio::time::sleep(self.confirm_interval).await,
            }
        }

        Err(GatewayError::TransactionRejected(format!(
            "confirmation timed out for transaction {hash}"
        )))
    }
}

#[async_trait]
impl LedgerTransport for HttpTransport {
    async fn call(&self, request: &CallRequest) -> Result<Value> {
        let result = self.simulate(request).await?;
        Ok(result.get("returnValue").cloned().unwrap_or(Value::Null))
    }

    async fn submit(&self, request: &CallRequest) -> Result<String> {
        // Simulation catches contract errors (bad role, insufficient
        // balance, inactive offer) before anything is signed.
        self.simulate(request).await?;

        let result = self
            .rpc("sendTransaction", self.invocation_params(request))
            .await?;

        let hash = result
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GatewayError::TransactionRejected("No transaction hash in response".to_string())
            })?
            .to_string();

        info!(function = request.function, %hash, "transaction sent, awaiting confirmation");
        self.wait_for_confirmation(&hash).await?;

        Ok(hash)
    }

    async fn events(&self, cursor: u64) -> Result<EventPage> {
        let result = self
            .rpc(
                "getEvents",
                json!({
                    "contractAddress": self.contract_address,
                    "startCursor": cursor,
                }),
            )
            .await?;

        serde_json::from_value(result)
            .map_err(|e| GatewayError::Network(format!("Malformed getEvents response: {e}")))
    }
}

/// Extract the human-readable reason from a ledger error payload.
fn ledger_reason(error: &Value) -> String {
    if let Some(message) = error.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    if let Some(code) = error.get("code") {
        return format!("ledger error (code: {code})");
    }
    error.to_string()
}
