use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    BroadcastResult, BuildResult, ConnectionState, ContractCall, FlowIntent, SignedTransaction,
    UnsignedTransaction, WalletEvent,
};

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("disconnected: {0}")]
    Disconnected(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Full-node access: contract call building, native transfers and broadcast.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn trigger_smart_contract(&self, call: &ContractCall) -> Result<BuildResult, PortError>;
    async fn build_trx_transfer(
        &self,
        to_address: &str,
        amount_sun: u64,
        owner_address: &str,
    ) -> Result<BuildResult, PortError>;
    async fn send_raw_transaction(
        &self,
        signed: &SignedTransaction,
    ) -> Result<BroadcastResult, PortError>;
}

/// Wallet connection lifecycle and signing.
///
/// Errors are classified through [`PortError`]: an unknown or uninstalled
/// wallet is `NotFound`, signing without a live session is `Disconnected`
/// and a user refusal in the wallet UI is `Rejected`.
#[async_trait]
pub trait WalletPort: Send + Sync {
    fn connection_state(&self) -> Result<ConnectionState, PortError>;
    fn available_wallets(&self) -> Result<Vec<String>, PortError>;
    async fn connect(&self, wallet_name: Option<&str>) -> Result<ConnectionState, PortError>;
    async fn disconnect(&self) -> Result<(), PortError>;
    async fn sign_message(&self, message: &str) -> Result<String, PortError>;
    async fn sign_transaction(
        &self,
        tx: &UnsignedTransaction,
    ) -> Result<SignedTransaction, PortError>;
    fn drain_events(&self) -> Result<Vec<WalletEvent>, PortError>;
}

pub trait IntentStore: Send + Sync {
    fn save_intent(&self, intent: &FlowIntent) -> Result<(), PortError>;
    fn load_intent(&self, intent_id: &str) -> Result<Option<FlowIntent>, PortError>;
    fn list_intents(&self) -> Result<Vec<FlowIntent>, PortError>;
}

pub trait ClockPort: Send + Sync {
    fn now_ms(&self) -> Result<u64, PortError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompensationOutcome {
    Compensated { txid: String },
    Deferred { reason: String },
}

/// Reacts to a saga whose approve leg landed but whose transfer leg failed.
#[async_trait]
pub trait CompensationHook: Send + Sync {
    async fn compensate(&self, intent: &FlowIntent) -> Result<CompensationOutcome, PortError>;
}

/// Leaves the allowance in place and the intent in `CompensationPending`.
#[derive(Debug, Clone, Default)]
pub struct DeferCompensation;

#[async_trait]
impl CompensationHook for DeferCompensation {
    async fn compensate(&self, intent: &FlowIntent) -> Result<CompensationOutcome, PortError> {
        Ok(CompensationOutcome::Deferred {
            reason: format!("compensation for {} left to operator", intent.intent_id),
        })
    }
}
