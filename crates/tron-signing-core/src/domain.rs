use std::fmt;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::PortError;
use crate::state_machine::SagaPhase;

pub const APPROVE_SIGNATURE: &str = "approve(address,uint256)";
pub const TRANSFER_USER_USDT_SIGNATURE: &str = "transferUserUSDT(uint256)";
pub const TOKEN_TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";

/// Fee ceiling in sun (100 TRX).
pub const DEFAULT_FEE_LIMIT: u64 = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimestampMs(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TypedParam {
    Address(String),
    Uint256(U256),
}

impl TypedParam {
    pub fn solidity_type(&self) -> &'static str {
        match self {
            TypedParam::Address(_) => "address",
            TypedParam::Uint256(_) => "uint256",
        }
    }
}

/// An unsigned contract invocation, created per user action and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub contract_address: String,
    pub method_signature: String,
    pub params: Vec<TypedParam>,
    pub fee_limit: u64,
    pub owner_address: String,
}

impl ContractCall {
    pub fn approve(
        token_contract: &str,
        spender_contract: &str,
        amount: U256,
        fee_limit: u64,
        owner_address: &str,
    ) -> Self {
        Self {
            contract_address: token_contract.to_owned(),
            method_signature: APPROVE_SIGNATURE.to_owned(),
            params: vec![
                TypedParam::Address(spender_contract.to_owned()),
                TypedParam::Uint256(amount),
            ],
            fee_limit,
            owner_address: owner_address.to_owned(),
        }
    }

    pub fn transfer_user_usdt(
        spender_contract: &str,
        amount: U256,
        fee_limit: u64,
        owner_address: &str,
    ) -> Self {
        Self {
            contract_address: spender_contract.to_owned(),
            method_signature: TRANSFER_USER_USDT_SIGNATURE.to_owned(),
            params: vec![TypedParam::Uint256(amount)],
            fee_limit,
            owner_address: owner_address.to_owned(),
        }
    }

    pub fn token_transfer(
        token_contract: &str,
        recipient: &str,
        amount: U256,
        fee_limit: u64,
        owner_address: &str,
    ) -> Self {
        Self {
            contract_address: token_contract.to_owned(),
            method_signature: TOKEN_TRANSFER_SIGNATURE.to_owned(),
            params: vec![
                TypedParam::Address(recipient.to_owned()),
                TypedParam::Uint256(amount),
            ],
            fee_limit,
            owner_address: owner_address.to_owned(),
        }
    }

    /// Checks that the parameter list is non-empty and matches the arity and
    /// types declared by `method_signature`.
    pub fn validate(&self) -> Result<(), PortError> {
        if self.contract_address.trim().is_empty() {
            return Err(PortError::Validation("missing contract address".to_owned()));
        }
        if self.owner_address.trim().is_empty() {
            return Err(PortError::Validation("missing owner address".to_owned()));
        }
        if self.fee_limit == 0 {
            return Err(PortError::Validation("fee limit must be positive".to_owned()));
        }
        if self.params.is_empty() {
            return Err(PortError::Validation(format!(
                "empty parameter list for {}",
                self.method_signature
            )));
        }
        let types = method_param_types(&self.method_signature)?;
        if types.len() != self.params.len() {
            return Err(PortError::Validation(format!(
                "argument count mismatch for {}: expected {}, got {}",
                self.method_signature,
                types.len(),
                self.params.len()
            )));
        }
        for (idx, (ty, param)) in types.iter().zip(self.params.iter()).enumerate() {
            if ty != param.solidity_type() {
                return Err(PortError::Validation(format!(
                    "param {idx} of {} is {ty}, got {}",
                    self.method_signature,
                    param.solidity_type()
                )));
            }
        }
        Ok(())
    }
}

/// Splits `name(type,type)` into its canonical parameter types.
pub fn method_param_types(method_signature: &str) -> Result<Vec<String>, PortError> {
    let (name, rest) = method_signature.split_once('(').ok_or_else(|| {
        PortError::Validation(format!("malformed method signature: {method_signature}"))
    })?;
    let inner = rest.strip_suffix(')').ok_or_else(|| {
        PortError::Validation(format!("malformed method signature: {method_signature}"))
    })?;
    if name.trim().is_empty() {
        return Err(PortError::Validation(format!(
            "method signature has no name: {method_signature}"
        )));
    }
    if inner.contains('(') || inner.contains(')') {
        return Err(PortError::Validation(format!(
            "tuple parameters are not supported: {method_signature}"
        )));
    }
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(inner
        .split(',')
        .map(|ty| match ty.trim() {
            "uint" => "uint256".to_owned(),
            other => other.to_owned(),
        })
        .collect())
}

/// Transaction JSON as returned by the full node's builder endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    #[serde(rename = "txID")]
    pub txid: String,
    pub raw_data: Value,
    #[serde(default)]
    pub raw_data_hex: String,
    #[serde(default)]
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub transaction: UnsignedTransaction,
    #[serde(default)]
    pub signature: Vec<String>,
}

impl SignedTransaction {
    pub fn has_signature(&self) -> bool {
        self.signature.iter().any(|s| !s.trim().is_empty())
    }

    pub fn txid(&self) -> &str {
        &self.transaction.txid
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFlag {
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildResult {
    #[serde(default)]
    pub result: Option<BuildFlag>,
    #[serde(default)]
    pub transaction: Option<UnsignedTransaction>,
}

impl BuildResult {
    pub fn ok(transaction: UnsignedTransaction) -> Self {
        Self {
            result: Some(BuildFlag {
                result: true,
                code: None,
                message: None,
            }),
            transaction: Some(transaction),
        }
    }

    pub fn into_transaction(self) -> Result<UnsignedTransaction, String> {
        let flag = self
            .result
            .ok_or_else(|| "builder returned no result".to_owned())?;
        if !flag.result {
            let detail = flag.message.or(flag.code).unwrap_or_default();
            return Err(format!("builder reported failure: {detail}"));
        }
        self.transaction
            .ok_or_else(|| "builder returned no transaction".to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastResult {
    pub result: bool,
    pub txid: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub raw: Value,
}

impl BroadcastResult {
    pub fn from_response(raw: Value) -> Self {
        let field = |key: &str| raw.get(key).and_then(|v| v.as_str()).map(str::to_owned);
        Self {
            result: raw.get("result").and_then(|v| v.as_bool()).unwrap_or(false),
            txid: field("txid"),
            code: field("code"),
            message: field("message"),
            raw: raw.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub connected: bool,
    pub wallet_name: Option<String>,
    pub address: Option<String>,
}

impl ConnectionState {
    pub fn connected_address(&self) -> Option<&str> {
        if self.connected {
            self.address.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEventKind {
    Connected,
    Disconnected,
    AccountChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEvent {
    pub sequence: u64,
    pub kind: WalletEventKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    Approve,
    Transfer,
    Revoke,
    TrxTransfer,
    TokenTransfer,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::Approve => "approve",
            FlowStep::Transfer => "transfer",
            FlowStep::Revoke => "revoke",
            FlowStep::TrxTransfer => "trx_transfer",
            FlowStep::TokenTransfer => "token_transfer",
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReceipt {
    pub step: FlowStep,
    pub txid: String,
    pub broadcast: BroadcastResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveTransferRequest {
    /// Token amount in base units (USDT has 6 decimals).
    pub amount: U256,
    pub spender_contract: String,
    pub token_contract: String,
    pub sender_address: String,
    /// Falls back to the orchestrator's default fee limit.
    pub fee_limit: Option<u64>,
}

/// Persisted record of one approve-then-transfer saga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowIntent {
    pub intent_id: String,
    pub sender: String,
    pub token_contract: String,
    pub spender_contract: String,
    pub amount: U256,
    pub fee_limit: u64,
    pub phase: SagaPhase,
    pub approve_txid: Option<String>,
    pub transfer_txid: Option<String>,
    pub compensation_txid: Option<String>,
    pub last_error: Option<String>,
    pub state_revision: u64,
    pub created_at_ms: TimestampMs,
    pub updated_at_ms: TimestampMs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowOutcome {
    pub intent_id: String,
    pub approve: StepReceipt,
    pub transfer: StepReceipt,
}
