use serde_json::Value;
use thiserror::Error;

use crate::domain::FlowStep;
use crate::ports::PortError;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("wallet not found: {0}")]
    WalletNotFound(String),
    #[error("wallet disconnected: {0}")]
    WalletDisconnected(String),
    #[error("{step} transaction build failed: {reason}")]
    TransactionBuild { step: FlowStep, reason: String },
    #[error("{step} signing rejected: {reason}")]
    SigningRejected { step: FlowStep, reason: String },
    #[error("{step} broadcast failed: {payload}")]
    Broadcast { step: FlowStep, payload: Value },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("flow already in progress for sender {0}")]
    FlowInProgress(String),
    #[error(transparent)]
    Port(#[from] PortError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    WalletNotFound,
    WalletDisconnected,
    TransactionBuild,
    SigningRejected,
    Broadcast,
    InvalidRequest,
    FlowInProgress,
    Unclassified,
}

impl FlowError {
    /// Classifies an error raised by the wallet port.
    pub fn from_wallet(step: Option<FlowStep>, err: PortError) -> Self {
        match (err, step) {
            (PortError::NotFound(msg), _) => FlowError::WalletNotFound(msg),
            (PortError::Disconnected(msg), _) => FlowError::WalletDisconnected(msg),
            (PortError::Rejected(reason), Some(step)) => {
                FlowError::SigningRejected { step, reason }
            }
            (other, _) => FlowError::Port(other),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::WalletNotFound(_) => ErrorKind::WalletNotFound,
            FlowError::WalletDisconnected(_) => ErrorKind::WalletDisconnected,
            FlowError::TransactionBuild { .. } => ErrorKind::TransactionBuild,
            FlowError::SigningRejected { .. } => ErrorKind::SigningRejected,
            FlowError::Broadcast { .. } => ErrorKind::Broadcast,
            FlowError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            FlowError::FlowInProgress(_) => ErrorKind::FlowInProgress,
            FlowError::Port(_) => ErrorKind::Unclassified,
        }
    }

    pub fn step(&self) -> Option<FlowStep> {
        match self {
            FlowError::TransactionBuild { step, .. }
            | FlowError::SigningRejected { step, .. }
            | FlowError::Broadcast { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub fn is_wallet_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::WalletNotFound | ErrorKind::WalletDisconnected
        )
    }
}
