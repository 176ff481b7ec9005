pub mod domain;
pub mod error;
pub mod feedback;
pub mod orchestrator;
pub mod pipeline;
pub mod ports;
pub mod state_machine;
pub mod units;

pub use domain::{
    method_param_types, ApproveTransferRequest, BroadcastResult, BuildFlag, BuildResult,
    ConnectionState, ContractCall, FlowIntent, FlowOutcome, FlowStep, SignedTransaction,
    StepReceipt, TimestampMs, TypedParam, UnsignedTransaction, WalletEvent, WalletEventKind,
    APPROVE_SIGNATURE, DEFAULT_FEE_LIMIT, TOKEN_TRANSFER_SIGNATURE, TRANSFER_USER_USDT_SIGNATURE,
};
pub use error::{ErrorKind, FlowError};
pub use feedback::{Notification, Severity};
pub use orchestrator::{ConcurrencyPolicy, FlowPolicy, Orchestrator};
pub use pipeline::{sign_and_broadcast, submit_contract_call};
pub use ports::{
    ChainClient, ClockPort, CompensationHook, CompensationOutcome, DeferCompensation,
    IntentStore, PortError, WalletPort,
};
pub use state_machine::{saga_transition, SagaAction, SagaPhase, StateTransition};
pub use units::{to_base_units, to_sun, TRX_DECIMALS};
