//! User-facing notifications derived from flow results.

use crate::domain::{FlowOutcome, StepReceipt};
use crate::error::{ErrorKind, FlowError};

pub const TRONSCAN_BASE_URL: &str = "https://tronscan.org/#";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub link: Option<String>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            link: None,
        }
    }

    /// Toast text for any flow error.
    pub fn from_error(err: &FlowError) -> Self {
        let message = match err.kind() {
            ErrorKind::WalletNotFound | ErrorKind::WalletDisconnected => err.to_string(),
            ErrorKind::FlowInProgress => {
                "A transaction flow is already running for this address".to_owned()
            }
            _ => format!("Transaction failed: {err}"),
        };
        Self {
            severity: Severity::Error,
            message,
            link: None,
        }
    }

    pub fn transfer_success(address: &str, receipt: &StepReceipt) -> Self {
        Self {
            severity: Severity::Success,
            message: format!("Success! {} broadcast as {}", receipt.step, receipt.txid),
            link: Some(address_url(address)),
        }
    }

    pub fn flow_success(outcome: &FlowOutcome) -> Self {
        Self {
            severity: Severity::Success,
            message: format!(
                "Approve {} and transfer {} broadcast",
                outcome.approve.txid, outcome.transfer.txid
            ),
            link: Some(transaction_url(&outcome.transfer.txid)),
        }
    }
}

pub fn address_url(address: &str) -> String {
    format!("{TRONSCAN_BASE_URL}/address/{address}")
}

pub fn transaction_url(txid: &str) -> String {
    format!("{TRONSCAN_BASE_URL}/transaction/{txid}")
}
