//! Boundary between the egui shell and the signing crates.
//! Every wallet or node call made by the UI goes through [`DappBridge`].

use std::sync::{Arc, Mutex};

use eframe::egui;
use tracing::{error, warn};

use tron_signing_adapters::{
    AdapterConfig, IntentStoreAdapter, RevokeAllowanceHook, SystemClockAdapter, TronGridClient,
    WalletAdapter,
};
use tron_signing_core::{
    ApproveTransferRequest, CompensationOutcome, ConnectionState, FlowError, FlowIntent,
    FlowOutcome, Orchestrator, PortError, StepReceipt, WalletEvent, WalletPort,
};

pub type DappOrchestrator = Orchestrator<
    TronGridClient,
    WalletAdapter,
    IntentStoreAdapter,
    SystemClockAdapter,
    RevokeAllowanceHook<TronGridClient, WalletAdapter>,
>;

/// Work the UI hands to a background thread.
#[derive(Debug, Clone)]
pub enum Operation {
    Connect(Option<String>),
    Disconnect,
    SignMessage(String),
    TransferTrx { receiver: String, amount_sun: u64 },
    ApproveTransfer(ApproveTransferRequest),
    ResumeCompensation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Connect,
    Disconnect,
    SignMessage,
    TransferTrx,
    ApproveTransfer,
    ResumeCompensation,
}

impl OpKind {
    pub fn label(&self) -> &'static str {
        match self {
            OpKind::Connect => "connect",
            OpKind::Disconnect => "disconnect",
            OpKind::SignMessage => "sign message",
            OpKind::TransferTrx => "TRX transfer",
            OpKind::ApproveTransfer => "approve and transfer",
            OpKind::ResumeCompensation => "compensation",
        }
    }
}

impl Operation {
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Connect(_) => OpKind::Connect,
            Operation::Disconnect => OpKind::Disconnect,
            Operation::SignMessage(_) => OpKind::SignMessage,
            Operation::TransferTrx { .. } => OpKind::TransferTrx,
            Operation::ApproveTransfer(_) => OpKind::ApproveTransfer,
            Operation::ResumeCompensation(_) => OpKind::ResumeCompensation,
        }
    }
}

#[derive(Debug)]
pub enum OpResult {
    Connected(ConnectionState),
    Disconnected,
    MessageSigned(String),
    TrxTransferred(StepReceipt),
    FlowCompleted(FlowOutcome),
    CompensationSettled(CompensationOutcome),
    Failed {
        op: OpKind,
        error: FlowError,
    },
}

/// Results posted by background threads, drained once per frame.
pub type ResultQueue = Arc<Mutex<Vec<OpResult>>>;

#[derive(Clone)]
pub struct DappBridge {
    orchestrator: Arc<DappOrchestrator>,
    runtime: Arc<tokio::runtime::Runtime>,
    config: Arc<AdapterConfig>,
}

impl DappBridge {
    pub fn from_config(config: AdapterConfig) -> Result<Self, PortError> {
        let chain = TronGridClient::with_config(&config)?;
        let wallet = WalletAdapter::with_config(&config);
        let hook = RevokeAllowanceHook::new(chain.clone(), wallet.clone());
        let orchestrator = Orchestrator::with_policy(
            chain,
            wallet,
            IntentStoreAdapter::from_config(&config),
            SystemClockAdapter,
            hook,
            config.flow_policy(),
        );
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| PortError::Transport(format!("failed to start async runtime: {e}")))?;
        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            runtime: Arc::new(runtime),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn connection_state(&self) -> ConnectionState {
        match self.orchestrator.connection_state() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "failed to read wallet state");
                ConnectionState::default()
            }
        }
    }

    pub fn available_wallets(&self) -> Vec<String> {
        self.orchestrator.wallet.available_wallets().unwrap_or_default()
    }

    pub fn drain_wallet_events(&self) -> Vec<WalletEvent> {
        self.orchestrator.wallet.drain_events().unwrap_or_default()
    }

    pub fn pending_compensations(&self) -> Vec<FlowIntent> {
        self.orchestrator
            .pending_compensations()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to list pending compensations");
                Vec::new()
            })
    }

    /// Runs `op` on a background thread and posts its result to `queue`.
    pub fn spawn(&self, ctx: &egui::Context, queue: &ResultQueue, op: Operation) {
        let bridge = self.clone();
        let queue = Arc::clone(queue);
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let result = bridge.runtime.block_on(bridge.run(op));
            match queue.lock() {
                Ok(mut g) => g.push(result),
                Err(e) => error!(error = %e, "result queue poisoned"),
            }
            ctx.request_repaint();
        });
    }

    async fn run(&self, op: Operation) -> OpResult {
        let kind = op.kind();
        let orch = &self.orchestrator;
        let result = match op {
            Operation::Connect(name) => orch.connect(name.as_deref()).await.map(OpResult::Connected),
            Operation::Disconnect => orch.disconnect().await.map(|_| OpResult::Disconnected),
            Operation::SignMessage(message) => {
                orch.sign_message(&message).await.map(OpResult::MessageSigned)
            }
            Operation::TransferTrx {
                receiver,
                amount_sun,
            } => orch
                .transfer_trx(&receiver, amount_sun)
                .await
                .map(OpResult::TrxTransferred),
            Operation::ApproveTransfer(request) => orch
                .execute_approve_then_transfer(request)
                .await
                .map(OpResult::FlowCompleted),
            Operation::ResumeCompensation(intent_id) => orch
                .resume_compensation(&intent_id)
                .await
                .map(OpResult::CompensationSettled),
        };
        result.unwrap_or_else(|error| {
            warn!(op = kind.label(), error = %error, "operation failed");
            OpResult::Failed { op: kind, error }
        })
    }
}
