use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::primitives::keccak256;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use tron_signing_core::{
    ConnectionState, PortError, SignedTransaction, UnsignedTransaction, WalletEvent,
    WalletEventKind, WalletPort,
};

use crate::address::TronAddress;
use crate::AdapterConfig;

pub const SUPPORTED_WALLETS: [&str; 6] = [
    "TronLink",
    "Bitget Wallet",
    "TokenPocket",
    "OKX Wallet",
    "WalletConnect",
    "Ledger",
];

/// EIP-1193 style provider error codes, as reused by TRON wallets.
const RPC_USER_REJECTED: i64 = 4001;
const RPC_UNSUPPORTED: i64 = 4200;
const RPC_DISCONNECTED: i64 = 4900;

#[derive(Debug, Clone)]
pub struct WalletAdapter {
    mode: WalletMode,
    installed: Vec<String>,
    preferred: Option<String>,
    state: Arc<Mutex<WalletState>>,
}

#[derive(Debug, Clone)]
enum WalletMode {
    Disabled(String),
    /// Local signer producing stable keccak-derived signatures.
    Deterministic { address: String },
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Default)]
struct WalletState {
    connection: ConnectionState,
    event_seq: u64,
    events: Vec<WalletEvent>,
}

impl Default for WalletAdapter {
    fn default() -> Self {
        Self::with_config(&AdapterConfig::from_env())
    }
}

impl WalletAdapter {
    pub fn with_config(config: &AdapterConfig) -> Self {
        let mode = if let Some(ref base_url) = config.wallet_proxy_url {
            let timeout = Duration::from_millis(config.request_timeout_ms);
            match reqwest::Client::builder().timeout(timeout).build() {
                Ok(client) => WalletMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        WalletMode::Disabled(format!(
                            "failed to initialize wallet proxy client in production profile: {e}"
                        ))
                    } else {
                        WalletMode::Deterministic {
                            address: config.deterministic_address.clone(),
                        }
                    }
                }
            }
        } else if config.strict_runtime_required() {
            WalletMode::Disabled(
                "wallet proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            WalletMode::Deterministic {
                address: config.deterministic_address.clone(),
            }
        };

        Self {
            mode,
            installed: config.installed_wallets.clone(),
            preferred: config.preferred_wallet.clone(),
            state: Arc::new(Mutex::new(WalletState::default())),
        }
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let WalletMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, WalletState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("wallet lock poisoned: {e}")))
    }

    fn connected_address(&self) -> Result<String, PortError> {
        self.lock()?
            .connection
            .connected_address()
            .map(str::to_owned)
            .ok_or_else(|| PortError::Disconnected("wallet is not connected".to_owned()))
    }

    fn resolve_wallet(&self, requested: Option<&str>) -> Result<String, PortError> {
        let name = requested
            .map(str::to_owned)
            .or_else(|| self.preferred.clone())
            .or_else(|| self.installed.first().cloned())
            .ok_or_else(|| PortError::NotFound("no wallet installed".to_owned()))?;
        if !SUPPORTED_WALLETS.contains(&name.as_str()) {
            return Err(PortError::NotFound(format!("unsupported wallet {name}")));
        }
        if !self.installed.iter().any(|w| w == &name) {
            return Err(PortError::NotFound(format!("{name} is not installed")));
        }
        Ok(name)
    }

    fn push_event(g: &mut WalletState, kind: WalletEventKind, value: String) {
        g.event_seq = g.event_seq.saturating_add(1);
        let sequence = g.event_seq;
        g.events.push(WalletEvent {
            sequence,
            kind,
            value,
        });
    }

    /// Simulates the wallet switching accounts underneath the dApp.
    pub fn debug_inject_account_changed(&self, address: &str) -> Result<(), PortError> {
        let parsed: TronAddress = address.parse()?;
        let mut g = self.lock()?;
        if !g.connection.connected {
            return Err(PortError::Disconnected("wallet is not connected".to_owned()));
        }
        g.connection.address = Some(parsed.to_base58());
        Self::push_event(&mut g, WalletEventKind::AccountChanged, parsed.to_base58());
        Ok(())
    }

    fn deterministic_signature(&self, domain: &str, signer: &str, payload: &[u8]) -> Vec<u8> {
        let mut seed = Vec::new();
        seed.extend_from_slice(domain.as_bytes());
        seed.extend_from_slice(signer.as_bytes());
        seed.extend_from_slice(payload);
        let hash = keccak256(seed);
        let mut sig = Vec::with_capacity(65);
        sig.extend_from_slice(hash.as_slice());
        sig.extend_from_slice(hash.as_slice());
        sig.push(0x1b);
        sig
    }

    async fn proxy_call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let proxy = match &self.mode {
            WalletMode::Proxy(proxy) => proxy,
            WalletMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
            WalletMode::Deterministic { .. } => {
                return Err(PortError::NotImplemented("wallet proxy runtime not enabled"))
            }
        };

        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        debug!(target: "adapters::wallet", method, "wallet proxy request");
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("wallet proxy request failed: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PortError::Transport(format!("wallet proxy status {status}: {e}")))?;
        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(PortError::Transport(format!(
                    "wallet proxy status {status}: {text}"
                )))
            }
            Err(e) => {
                return Err(PortError::Transport(format!(
                    "wallet proxy json decode failed: {e}"
                )))
            }
        };
        if let Some(err) = body.get("error") {
            return Err(rpc_error(err));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "wallet proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("wallet proxy missing result".to_owned()))
    }
}

fn rpc_error(err: &Value) -> PortError {
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("wallet error")
        .to_owned();
    match err.get("code").and_then(Value::as_i64) {
        Some(RPC_USER_REJECTED) => PortError::Rejected(message),
        Some(RPC_DISCONNECTED) => PortError::Disconnected(message),
        Some(RPC_UNSUPPORTED) => PortError::NotFound(message),
        _ => PortError::Transport(format!("wallet proxy returned error: {err}")),
    }
}

fn first_account(result: &Value) -> Result<String, PortError> {
    let raw = match result {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.first().and_then(Value::as_str),
        _ => None,
    }
    .ok_or_else(|| PortError::Transport("tron_requestAccounts returned no account".to_owned()))?;
    let parsed: TronAddress = raw.parse()?;
    Ok(parsed.to_base58())
}

#[async_trait]
impl WalletPort for WalletAdapter {
    fn connection_state(&self) -> Result<ConnectionState, PortError> {
        Ok(self.lock()?.connection.clone())
    }

    fn available_wallets(&self) -> Result<Vec<String>, PortError> {
        Ok(self.installed.clone())
    }

    async fn connect(&self, wallet_name: Option<&str>) -> Result<ConnectionState, PortError> {
        self.check_mode()?;
        let name = self.resolve_wallet(wallet_name)?;

        let address = match &self.mode {
            WalletMode::Proxy(_) => {
                let result = self
                    .proxy_call("tron_requestAccounts", json!([name]))
                    .await?;
                first_account(&result)?
            }
            WalletMode::Deterministic { address } => {
                let parsed: TronAddress = address.parse()?;
                parsed.to_base58()
            }
            WalletMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
        };

        let mut g = self.lock()?;
        let previous = g.connection.connected_address().map(str::to_owned);
        g.connection = ConnectionState {
            connected: true,
            wallet_name: Some(name.clone()),
            address: Some(address.clone()),
        };
        match previous {
            Some(prev) if prev != address => {
                Self::push_event(&mut g, WalletEventKind::AccountChanged, address.clone())
            }
            Some(_) => {}
            None => Self::push_event(&mut g, WalletEventKind::Connected, name.clone()),
        }
        info!(target: "adapters::wallet", wallet = %name, %address, "wallet connected");
        Ok(g.connection.clone())
    }

    async fn disconnect(&self) -> Result<(), PortError> {
        self.check_mode()?;
        if matches!(self.mode, WalletMode::Proxy(_)) {
            self.proxy_call("tron_disconnect", json!([])).await?;
        }
        let mut g = self.lock()?;
        if let Some(name) = g.connection.wallet_name.take() {
            Self::push_event(&mut g, WalletEventKind::Disconnected, name);
        }
        g.connection = ConnectionState::default();
        Ok(())
    }

    async fn sign_message(&self, message: &str) -> Result<String, PortError> {
        self.check_mode()?;
        let address = self.connected_address()?;
        if let WalletMode::Proxy(_) = self.mode {
            let result = self
                .proxy_call("tron_signMessage", json!([message, address]))
                .await?;
            return result.as_str().map(str::to_owned).ok_or_else(|| {
                PortError::Transport("sign response must be hex string".to_owned())
            });
        }
        let sig = self.deterministic_signature("message", &address, message.as_bytes());
        Ok(format!("0x{}", alloy::hex::encode(sig)))
    }

    async fn sign_transaction(
        &self,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, PortError> {
        self.check_mode()?;
        let address = self.connected_address()?;
        if let WalletMode::Proxy(_) = self.mode {
            let payload = serde_json::to_value(tx)
                .map_err(|e| PortError::Validation(format!("tx serialization failed: {e}")))?;
            let result = self
                .proxy_call("tron_signTransaction", json!([payload, address]))
                .await?;
            return serde_json::from_value(result)
                .map_err(|e| PortError::Transport(format!("unexpected signed transaction: {e}")));
        }
        let txid = alloy::hex::decode(&tx.txid)
            .map_err(|e| PortError::Validation(format!("invalid txID: {e}")))?;
        let sig = self.deterministic_signature("transaction", &address, &txid);
        Ok(SignedTransaction {
            transaction: tx.clone(),
            signature: vec![alloy::hex::encode(sig)],
        })
    }

    fn drain_events(&self) -> Result<Vec<WalletEvent>, PortError> {
        self.check_mode()?;
        let mut g = self.lock()?;
        Ok(std::mem::take(&mut g.events))
    }
}
