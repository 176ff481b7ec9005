#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use tron_signing_core::{
    BroadcastResult, BuildFlag, BuildResult, ChainClient, ClockPort, CompensationHook,
    CompensationOutcome, ConnectionState, ContractCall, FlowIntent, IntentStore, Orchestrator,
    PortError, SignedTransaction, UnsignedTransaction, WalletEvent, WalletPort,
};

pub const SENDER: &str = "TPZvqumzsmNhLNLMYGb7o2rUAfXqtFgkmR";
pub const TOKEN: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
pub const SPENDER: &str = "TJcyoiPsNra9ozVkAMHaXaDhH8TJCUwuLD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    NoResult,
    FalseFlag,
}

#[derive(Debug, Default)]
struct ChainState {
    builds: Vec<ContractCall>,
    trx_builds: Vec<(String, u64, String)>,
    broadcasts: Vec<SignedTransaction>,
    build_modes: HashMap<String, BuildMode>,
    rejected_broadcasts: HashSet<String>,
    seq: u64,
}

/// Chain double that records every call and tags txids with the method name.
#[derive(Debug, Default)]
pub struct RecordingChain {
    state: Mutex<ChainState>,
}

impl RecordingChain {
    pub fn fail_build(self, method_signature: &str, mode: BuildMode) -> Self {
        self.state
            .lock()
            .unwrap()
            .build_modes
            .insert(method_signature.to_owned(), mode);
        self
    }

    pub fn reject_broadcast(self, method_signature: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .rejected_broadcasts
            .insert(method_signature.to_owned());
        self
    }

    pub fn build_count(&self) -> usize {
        self.state.lock().unwrap().builds.len()
    }

    pub fn built_methods(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .builds
            .iter()
            .map(|c| c.method_signature.clone())
            .collect()
    }

    pub fn builds(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().builds.clone()
    }

    pub fn trx_builds(&self) -> Vec<(String, u64, String)> {
        self.state.lock().unwrap().trx_builds.clone()
    }

    pub fn broadcast_count(&self) -> usize {
        self.state.lock().unwrap().broadcasts.len()
    }

    pub fn broadcast_methods(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .broadcasts
            .iter()
            .map(|tx| {
                tx.transaction.raw_data["method"]
                    .as_str()
                    .unwrap_or_default()
                    .to_owned()
            })
            .collect()
    }
}

fn unsigned(seq: u64, method: &str, contract: &str) -> UnsignedTransaction {
    UnsignedTransaction {
        txid: format!("{seq:064x}"),
        raw_data: json!({ "method": method, "contract": contract }),
        raw_data_hex: format!("{seq:08x}"),
        visible: true,
    }
}

#[async_trait]
impl ChainClient for RecordingChain {
    async fn trigger_smart_contract(&self, call: &ContractCall) -> Result<BuildResult, PortError> {
        // suspend once, like a real node round-trip, so concurrent flows interleave
        tokio::task::yield_now().await;
        let mut g = self.state.lock().unwrap();
        g.builds.push(call.clone());
        g.seq += 1;
        match g.build_modes.get(&call.method_signature) {
            Some(BuildMode::NoResult) => Ok(BuildResult::default()),
            Some(BuildMode::FalseFlag) => Ok(BuildResult {
                result: Some(BuildFlag {
                    result: false,
                    code: Some("CONTRACT_VALIDATE_ERROR".to_owned()),
                    message: Some("contract validate error".to_owned()),
                }),
                transaction: None,
            }),
            None => Ok(BuildResult::ok(unsigned(
                g.seq,
                &call.method_signature,
                &call.contract_address,
            ))),
        }
    }

    async fn build_trx_transfer(
        &self,
        to_address: &str,
        amount_sun: u64,
        owner_address: &str,
    ) -> Result<BuildResult, PortError> {
        let mut g = self.state.lock().unwrap();
        g.trx_builds
            .push((to_address.to_owned(), amount_sun, owner_address.to_owned()));
        g.seq += 1;
        Ok(BuildResult::ok(unsigned(g.seq, "TransferContract", to_address)))
    }

    async fn send_raw_transaction(
        &self,
        signed: &SignedTransaction,
    ) -> Result<BroadcastResult, PortError> {
        let mut g = self.state.lock().unwrap();
        g.broadcasts.push(signed.clone());
        let method = signed.transaction.raw_data["method"]
            .as_str()
            .unwrap_or_default();
        if g.rejected_broadcasts.contains(method) {
            return Ok(BroadcastResult::from_response(json!({
                "code": "SIGERROR",
                "message": "validate signature error",
            })));
        }
        Ok(BroadcastResult::from_response(json!({
            "result": true,
            "txid": signed.txid(),
        })))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignMode {
    Sign,
    EmptySignature,
    Reject,
}

#[derive(Debug)]
struct WalletState {
    connection: ConnectionState,
    mode: SignMode,
    /// Sign mode applied from the n-th signature request on (1-based).
    mode_from: usize,
    sign_requests: usize,
}

#[derive(Debug)]
pub struct ScriptedWallet {
    state: Mutex<WalletState>,
}

impl ScriptedWallet {
    pub fn connected() -> Self {
        Self {
            state: Mutex::new(WalletState {
                connection: ConnectionState {
                    connected: true,
                    wallet_name: Some("TronLink".to_owned()),
                    address: Some(SENDER.to_owned()),
                },
                mode: SignMode::Sign,
                mode_from: 1,
                sign_requests: 0,
            }),
        }
    }

    pub fn disconnected() -> Self {
        let wallet = Self::connected();
        wallet.state.lock().unwrap().connection = ConnectionState::default();
        wallet
    }

    pub fn with_mode(self, mode: SignMode) -> Self {
        self.with_mode_from(mode, 1)
    }

    pub fn with_mode_from(self, mode: SignMode, from_request: usize) -> Self {
        {
            let mut g = self.state.lock().unwrap();
            g.mode = mode;
            g.mode_from = from_request;
        }
        self
    }

    pub fn sign_requests(&self) -> usize {
        self.state.lock().unwrap().sign_requests
    }
}

#[async_trait]
impl WalletPort for ScriptedWallet {
    fn connection_state(&self) -> Result<ConnectionState, PortError> {
        Ok(self.state.lock().unwrap().connection.clone())
    }

    fn available_wallets(&self) -> Result<Vec<String>, PortError> {
        Ok(vec!["TronLink".to_owned()])
    }

    async fn connect(&self, wallet_name: Option<&str>) -> Result<ConnectionState, PortError> {
        let name = wallet_name.unwrap_or("TronLink");
        if name != "TronLink" {
            return Err(PortError::NotFound(format!("{name} is not installed")));
        }
        let mut g = self.state.lock().unwrap();
        g.connection = ConnectionState {
            connected: true,
            wallet_name: Some(name.to_owned()),
            address: Some(SENDER.to_owned()),
        };
        Ok(g.connection.clone())
    }

    async fn disconnect(&self) -> Result<(), PortError> {
        self.state.lock().unwrap().connection = ConnectionState::default();
        Ok(())
    }

    async fn sign_message(&self, message: &str) -> Result<String, PortError> {
        let g = self.state.lock().unwrap();
        if !g.connection.connected {
            return Err(PortError::Disconnected("wallet is not connected".to_owned()));
        }
        Ok(format!("0xsig:{message}"))
    }

    async fn sign_transaction(
        &self,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, PortError> {
        let mut g = self.state.lock().unwrap();
        if !g.connection.connected {
            return Err(PortError::Disconnected("wallet is not connected".to_owned()));
        }
        g.sign_requests += 1;
        let mode = if g.sign_requests >= g.mode_from {
            g.mode
        } else {
            SignMode::Sign
        };
        let signature = match mode {
            SignMode::Sign => vec![format!("{}1b", tx.txid)],
            SignMode::EmptySignature => Vec::new(),
            SignMode::Reject => {
                return Err(PortError::Rejected("user rejected the request".to_owned()))
            }
        };
        Ok(SignedTransaction {
            transaction: tx.clone(),
            signature,
        })
    }

    fn drain_events(&self) -> Result<Vec<WalletEvent>, PortError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Default)]
pub struct MemoryIntents {
    intents: Mutex<HashMap<String, FlowIntent>>,
}

impl IntentStore for MemoryIntents {
    fn save_intent(&self, intent: &FlowIntent) -> Result<(), PortError> {
        self.intents
            .lock()
            .unwrap()
            .insert(intent.intent_id.clone(), intent.clone());
        Ok(())
    }

    fn load_intent(&self, intent_id: &str) -> Result<Option<FlowIntent>, PortError> {
        Ok(self.intents.lock().unwrap().get(intent_id).cloned())
    }

    fn list_intents(&self) -> Result<Vec<FlowIntent>, PortError> {
        Ok(self.intents.lock().unwrap().values().cloned().collect())
    }
}

/// Memory store whose n-th saves (1-based) fail with a transport error.
#[derive(Debug, Default)]
pub struct FlakyIntents {
    inner: MemoryIntents,
    saves: AtomicU64,
    failing: HashSet<u64>,
}

impl FlakyIntents {
    pub fn failing_saves(saves: &[u64]) -> Self {
        Self {
            failing: saves.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn save_attempts(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }
}

impl IntentStore for FlakyIntents {
    fn save_intent(&self, intent: &FlowIntent) -> Result<(), PortError> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.contains(&n) {
            return Err(PortError::Transport(format!("disk full on save {n}")));
        }
        self.inner.save_intent(intent)
    }

    fn load_intent(&self, intent_id: &str) -> Result<Option<FlowIntent>, PortError> {
        self.inner.load_intent(intent_id)
    }

    fn list_intents(&self) -> Result<Vec<FlowIntent>, PortError> {
        self.inner.list_intents()
    }
}

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(self.now.fetch_add(1, Ordering::SeqCst) + 1_760_000_000_000)
    }
}

#[derive(Debug)]
pub struct RecordingCompensation {
    outcome: Result<CompensationOutcome, String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingCompensation {
    pub fn compensating() -> Self {
        Self {
            outcome: Ok(CompensationOutcome::Compensated {
                txid: "revoke-tx".to_owned(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn deferring() -> Self {
        Self {
            outcome: Ok(CompensationOutcome::Deferred {
                reason: "manual".to_owned(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            outcome: Err("node unreachable".to_owned()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompensationHook for RecordingCompensation {
    async fn compensate(&self, intent: &FlowIntent) -> Result<CompensationOutcome, PortError> {
        self.calls.lock().unwrap().push(intent.intent_id.clone());
        self.outcome
            .clone()
            .map_err(PortError::Transport)
    }
}

pub type TestOrchestrator =
    Orchestrator<RecordingChain, ScriptedWallet, MemoryIntents, TestClock, RecordingCompensation>;

pub fn new_orchestrator(chain: RecordingChain, wallet: ScriptedWallet) -> TestOrchestrator {
    Orchestrator::new(
        chain,
        wallet,
        MemoryIntents::default(),
        TestClock::default(),
        RecordingCompensation::deferring(),
    )
}
