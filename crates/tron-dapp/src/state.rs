//! Per-panel UI state.

use alloy::primitives::U256;

use tron_signing_adapters::AdapterConfig;
use tron_signing_core::{
    to_base_units, to_sun, ApproveTransferRequest, ConnectionState, FlowError, Notification,
};

/// USDT (TRC-20) decimals.
pub const TOKEN_DECIMALS: u8 = 6;

#[derive(Debug, Default)]
pub struct WalletPanelState {
    pub wallets: Vec<String>,
    pub selected_wallet: String,
    pub connection: ConnectionState,
    pub busy: bool,
}

impl WalletPanelState {
    pub fn new(wallets: Vec<String>, preferred: Option<&str>) -> Self {
        let selected_wallet = preferred
            .map(str::to_owned)
            .or_else(|| wallets.first().cloned())
            .unwrap_or_default();
        Self {
            wallets,
            selected_wallet,
            ..Self::default()
        }
    }

    pub fn selected(&self) -> Option<String> {
        if self.selected_wallet.is_empty() {
            None
        } else {
            Some(self.selected_wallet.clone())
        }
    }
}

#[derive(Debug)]
pub struct SignMessageState {
    pub message: String,
    pub signature: Option<String>,
    pub busy: bool,
}

impl Default for SignMessageState {
    fn default() -> Self {
        Self {
            message: "Hello, TRON".to_owned(),
            signature: None,
            busy: false,
        }
    }
}

/// Inline banner shown under an action until the next attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success(Notification),
    Failure(String),
}

#[derive(Debug, Default)]
pub struct TransferState {
    pub receiver: String,
    pub amount: String,
    pub busy: bool,
    pub banner: Option<Banner>,
}

impl TransferState {
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self {
            receiver: config.demo_receiver.clone(),
            amount: config.trx_transfer_amount.clone(),
            ..Self::default()
        }
    }

    pub fn amount_sun(&self) -> Result<u64, FlowError> {
        let sun = to_sun(&self.amount)?;
        if sun == 0 {
            return Err(FlowError::InvalidRequest("amount must be positive".to_owned()));
        }
        Ok(sun)
    }
}

#[derive(Debug, Default)]
pub struct ApproveState {
    pub amount: String,
    pub token_contract: String,
    pub spender_contract: String,
    pub busy: bool,
    pub banner: Option<Banner>,
}

impl ApproveState {
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self {
            amount: config.approve_amount.clone(),
            token_contract: config.token_contract.clone(),
            spender_contract: config.spender_contract.clone(),
            ..Self::default()
        }
    }

    /// Builds the approve-then-transfer request for `sender`.
    pub fn request(&self, sender: &str) -> Result<ApproveTransferRequest, FlowError> {
        let amount: U256 = to_base_units(&self.amount, TOKEN_DECIMALS)?;
        Ok(ApproveTransferRequest {
            amount,
            spender_contract: self.spender_contract.trim().to_owned(),
            token_contract: self.token_contract.trim().to_owned(),
            sender_address: sender.to_owned(),
            fee_limit: None,
        })
    }
}
