use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::U256;
use tracing::{debug, info, warn};

use crate::domain::{
    ApproveTransferRequest, ConnectionState, ContractCall, FlowIntent, FlowOutcome, FlowStep,
    StepReceipt, TimestampMs, DEFAULT_FEE_LIMIT,
};
use crate::error::FlowError;
use crate::pipeline::{sign_and_broadcast, submit_contract_call};
use crate::ports::{
    ChainClient, ClockPort, CompensationHook, CompensationOutcome, IntentStore, PortError,
    WalletPort,
};
use crate::state_machine::{saga_transition, SagaAction, SagaPhase, StateTransition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyPolicy {
    /// At most one flow per sender address at a time.
    #[default]
    RejectDuplicate,
    Allow,
}

#[derive(Debug, Clone)]
pub struct FlowPolicy {
    pub default_fee_limit: u64,
    pub concurrency: ConcurrencyPolicy,
}

impl Default for FlowPolicy {
    fn default() -> Self {
        Self {
            default_fee_limit: DEFAULT_FEE_LIMIT,
            concurrency: ConcurrencyPolicy::default(),
        }
    }
}

pub struct Orchestrator<C, W, S, K, H>
where
    C: ChainClient,
    W: WalletPort,
    S: IntentStore,
    K: ClockPort,
    H: CompensationHook,
{
    pub chain: C,
    pub wallet: W,
    pub intents: S,
    pub clock: K,
    pub compensation: H,
    policy: FlowPolicy,
    in_flight: InFlightRegistry,
    intent_seq: AtomicU64,
}

impl<C, W, S, K, H> Orchestrator<C, W, S, K, H>
where
    C: ChainClient,
    W: WalletPort,
    S: IntentStore,
    K: ClockPort,
    H: CompensationHook,
{
    pub fn new(chain: C, wallet: W, intents: S, clock: K, compensation: H) -> Self {
        Self::with_policy(chain, wallet, intents, clock, compensation, FlowPolicy::default())
    }

    pub fn with_policy(
        chain: C,
        wallet: W,
        intents: S,
        clock: K,
        compensation: H,
        policy: FlowPolicy,
    ) -> Self {
        Self {
            chain,
            wallet,
            intents,
            clock,
            compensation,
            policy,
            in_flight: InFlightRegistry::default(),
            intent_seq: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> &FlowPolicy {
        &self.policy
    }

    pub fn is_in_flight(&self, sender: &str) -> bool {
        self.in_flight.contains(sender)
    }

    pub fn connection_state(&self) -> Result<ConnectionState, FlowError> {
        Ok(self.wallet.connection_state()?)
    }

    pub async fn connect(&self, wallet_name: Option<&str>) -> Result<ConnectionState, FlowError> {
        let state = self
            .wallet
            .connect(wallet_name)
            .await
            .map_err(|e| FlowError::from_wallet(None, e))?;
        info!(
            target: "flow::orchestrator",
            wallet = ?state.wallet_name,
            address = ?state.address,
            "wallet is now connected"
        );
        Ok(state)
    }

    pub async fn disconnect(&self) -> Result<(), FlowError> {
        self.wallet
            .disconnect()
            .await
            .map_err(|e| FlowError::from_wallet(None, e))
    }

    pub async fn sign_message(&self, message: &str) -> Result<String, FlowError> {
        self.require_address()?;
        self.wallet
            .sign_message(message)
            .await
            .map_err(|e| FlowError::from_wallet(None, e))
    }

    /// Native TRX transfer from the connected address.
    pub async fn transfer_trx(
        &self,
        receiver: &str,
        amount_sun: u64,
    ) -> Result<StepReceipt, FlowError> {
        let owner = self.require_address()?;
        if receiver.trim().is_empty() {
            return Err(FlowError::InvalidRequest("missing receiver".to_owned()));
        }
        if amount_sun == 0 {
            return Err(FlowError::InvalidRequest(
                "amount must be positive".to_owned(),
            ));
        }
        let _guard = self.enter(&owner)?;

        let step = FlowStep::TrxTransfer;
        let built = self
            .chain
            .build_trx_transfer(receiver, amount_sun, &owner)
            .await
            .map_err(|e| FlowError::TransactionBuild {
                step,
                reason: e.to_string(),
            })?;
        let tx = built
            .into_transaction()
            .map_err(|reason| FlowError::TransactionBuild { step, reason })?;
        sign_and_broadcast(&self.chain, &self.wallet, step, tx).await
    }

    /// Single-step TRC-20 `transfer(address,uint256)` from the connected address.
    pub async fn transfer_token(
        &self,
        token_contract: &str,
        recipient: &str,
        amount: U256,
    ) -> Result<StepReceipt, FlowError> {
        let owner = self.require_address()?;
        if amount.is_zero() {
            return Err(FlowError::InvalidRequest(
                "amount must be positive".to_owned(),
            ));
        }
        let _guard = self.enter(&owner)?;
        let call = ContractCall::token_transfer(
            token_contract,
            recipient,
            amount,
            self.policy.default_fee_limit,
            &owner,
        );
        submit_contract_call(&self.chain, &self.wallet, FlowStep::TokenTransfer, &call).await
    }

    /// Approve `spender_contract` for `amount` on `token_contract`, then call
    /// `transferUserUSDT(amount)` on the spender. The transfer leg only runs
    /// after the approve broadcast was accepted.
    pub async fn execute_approve_then_transfer(
        &self,
        request: ApproveTransferRequest,
    ) -> Result<FlowOutcome, FlowError> {
        let request = normalize_request(request);
        validate_request(&request)?;
        let _guard = self.enter(&request.sender_address)?;
        let fee_limit = request.fee_limit.unwrap_or(self.policy.default_fee_limit);
        let mut intent = self.record_intent(&request, fee_limit)?;
        info!(
            target: "flow::orchestrator",
            intent_id = %intent.intent_id,
            sender = %intent.sender,
            token = %intent.token_contract,
            spender = %intent.spender_contract,
            amount = %intent.amount,
            "approve-then-transfer recorded"
        );

        self.advance(&mut intent, SagaAction::StartApprove)?;
        let approve_call = ContractCall::approve(
            &request.token_contract,
            &request.spender_contract,
            request.amount,
            fee_limit,
            &request.sender_address,
        );
        let approve = match submit_contract_call(
            &self.chain,
            &self.wallet,
            FlowStep::Approve,
            &approve_call,
        )
        .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                self.record_failure(&mut intent, SagaAction::Fail, &err);
                return Err(err);
            }
        };
        // approve is on-chain; store failures past this point are logged, not returned
        intent.approve_txid = Some(approve.txid.clone());
        self.advance_after_approve(&mut intent, SagaAction::ApproveConfirmed)?;
        self.advance_after_approve(&mut intent, SagaAction::StartTransfer)?;
        let transfer_call = ContractCall::transfer_user_usdt(
            &request.spender_contract,
            request.amount,
            fee_limit,
            &request.sender_address,
        );
        match submit_contract_call(&self.chain, &self.wallet, FlowStep::Transfer, &transfer_call)
            .await
        {
            Ok(transfer) => {
                intent.transfer_txid = Some(transfer.txid.clone());
                self.advance_after_approve(&mut intent, SagaAction::TransferConfirmed)?;
                info!(
                    target: "flow::orchestrator",
                    intent_id = %intent.intent_id,
                    approve_txid = %approve.txid,
                    transfer_txid = %transfer.txid,
                    "approve-then-transfer completed"
                );
                Ok(FlowOutcome {
                    intent_id: intent.intent_id,
                    approve,
                    transfer,
                })
            }
            Err(err) => {
                warn!(
                    target: "flow::orchestrator",
                    intent_id = %intent.intent_id,
                    approve_txid = %approve.txid,
                    error = %err,
                    "transfer failed after approve landed"
                );
                self.record_failure(&mut intent, SagaAction::RequestCompensation, &err);
                if intent.phase == SagaPhase::CompensationPending {
                    if let Ok(outcome) = self.run_compensation(&mut intent).await {
                        debug!(
                            target: "flow::orchestrator",
                            intent_id = %intent.intent_id,
                            ?outcome,
                            "compensation attempted"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    /// Retries the compensation hook for an intent left in `CompensationPending`.
    pub async fn resume_compensation(
        &self,
        intent_id: &str,
    ) -> Result<CompensationOutcome, FlowError> {
        let mut intent = self
            .intents
            .load_intent(intent_id)?
            .ok_or_else(|| FlowError::InvalidRequest(format!("unknown intent: {intent_id}")))?;
        if intent.phase != SagaPhase::CompensationPending {
            return Err(FlowError::InvalidRequest(format!(
                "intent {intent_id} is {:?}, not awaiting compensation",
                intent.phase
            )));
        }
        let _guard = self.enter(&intent.sender)?;
        self.run_compensation(&mut intent).await
    }

    pub fn pending_compensations(&self) -> Result<Vec<FlowIntent>, FlowError> {
        Ok(self
            .intents
            .list_intents()?
            .into_iter()
            .filter(|x| x.phase == SagaPhase::CompensationPending)
            .collect())
    }

    async fn run_compensation(
        &self,
        intent: &mut FlowIntent,
    ) -> Result<CompensationOutcome, FlowError> {
        match self.compensation.compensate(intent).await {
            Ok(CompensationOutcome::Compensated { txid }) => {
                intent.compensation_txid = Some(txid.clone());
                self.advance(intent, SagaAction::CompensationConfirmed)?;
                info!(
                    target: "flow::orchestrator",
                    intent_id = %intent.intent_id,
                    %txid,
                    "compensation broadcast"
                );
                Ok(CompensationOutcome::Compensated { txid })
            }
            Ok(CompensationOutcome::Deferred { reason }) => {
                warn!(
                    target: "flow::orchestrator",
                    intent_id = %intent.intent_id,
                    %reason,
                    "compensation deferred"
                );
                Ok(CompensationOutcome::Deferred { reason })
            }
            Err(e) => {
                warn!(
                    target: "flow::orchestrator",
                    intent_id = %intent.intent_id,
                    error = %e,
                    "compensation failed"
                );
                intent.last_error = Some(format!("compensation failed: {e}"));
                self.persist(intent)?;
                Err(e.into())
            }
        }
    }

    fn require_address(&self) -> Result<String, FlowError> {
        let state = self.wallet.connection_state()?;
        state
            .connected_address()
            .map(str::to_owned)
            .ok_or_else(|| FlowError::WalletDisconnected("wallet is not connected".to_owned()))
    }

    fn enter(&self, sender: &str) -> Result<Option<InFlightGuard>, FlowError> {
        match self.policy.concurrency {
            ConcurrencyPolicy::RejectDuplicate => self.in_flight.acquire(sender).map(Some),
            ConcurrencyPolicy::Allow => Ok(None),
        }
    }

    fn record_intent(
        &self,
        request: &ApproveTransferRequest,
        fee_limit: u64,
    ) -> Result<FlowIntent, FlowError> {
        let now = TimestampMs(self.clock.now_ms()?);
        let seq = self.intent_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let intent = FlowIntent {
            intent_id: format!("intent-{}-{seq}", now.0),
            sender: request.sender_address.clone(),
            token_contract: request.token_contract.clone(),
            spender_contract: request.spender_contract.clone(),
            amount: request.amount,
            fee_limit,
            phase: SagaPhase::Recorded,
            approve_txid: None,
            transfer_txid: None,
            compensation_txid: None,
            last_error: None,
            state_revision: 0,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.intents.save_intent(&intent)?;
        Ok(intent)
    }

    fn advance(
        &self,
        intent: &mut FlowIntent,
        action: SagaAction,
    ) -> Result<StateTransition, FlowError> {
        let (phase, transition) = saga_transition(intent.phase, action)?;
        intent.phase = phase;
        self.persist(intent)?;
        Ok(transition)
    }

    /// Applies `action` and persists it, logging instead of failing when only
    /// the store write went wrong. Illegal transitions still fail.
    fn advance_after_approve(
        &self,
        intent: &mut FlowIntent,
        action: SagaAction,
    ) -> Result<(), FlowError> {
        let (phase, _) = saga_transition(intent.phase, action)?;
        intent.phase = phase;
        if let Err(e) = self.persist(intent) {
            warn!(
                target: "flow::orchestrator",
                intent_id = %intent.intent_id,
                phase = ?intent.phase,
                approve_txid = ?intent.approve_txid,
                error = %e,
                "failed to persist intent after approve landed"
            );
        }
        Ok(())
    }

    /// Records a failed leg without masking the error that caused it.
    fn record_failure(&self, intent: &mut FlowIntent, action: SagaAction, err: &FlowError) {
        intent.last_error = Some(err.to_string());
        if let Err(e) = self.advance(intent, action) {
            warn!(
                target: "flow::orchestrator",
                intent_id = %intent.intent_id,
                error = %e,
                "failed to persist intent failure"
            );
        }
    }

    fn persist(&self, intent: &mut FlowIntent) -> Result<(), FlowError> {
        intent.state_revision = intent.state_revision.saturating_add(1);
        intent.updated_at_ms = TimestampMs(self.clock.now_ms()?);
        self.intents.save_intent(intent)?;
        Ok(())
    }
}

fn normalize_request(mut request: ApproveTransferRequest) -> ApproveTransferRequest {
    for field in [
        &mut request.sender_address,
        &mut request.spender_contract,
        &mut request.token_contract,
    ] {
        *field = field.trim().to_owned();
    }
    request
}

fn validate_request(request: &ApproveTransferRequest) -> Result<(), FlowError> {
    if request.amount.is_zero() {
        return Err(FlowError::InvalidRequest(
            "amount must be positive".to_owned(),
        ));
    }
    for (label, value) in [
        ("sender", &request.sender_address),
        ("spender contract", &request.spender_contract),
        ("token contract", &request.token_contract),
    ] {
        if value.trim().is_empty() {
            return Err(FlowError::InvalidRequest(format!("missing {label}")));
        }
    }
    if request.fee_limit == Some(0) {
        return Err(FlowError::InvalidRequest(
            "fee limit must be positive".to_owned(),
        ));
    }
    Ok(())
}

#[derive(Debug, Default)]
struct InFlightRegistry {
    senders: Arc<Mutex<HashSet<String>>>,
}

impl InFlightRegistry {
    fn acquire(&self, sender: &str) -> Result<InFlightGuard, FlowError> {
        let sender = sender.trim();
        let mut g = self
            .senders
            .lock()
            .map_err(|e| PortError::Transport(format!("in-flight lock poisoned: {e}")))?;
        if !g.insert(sender.to_owned()) {
            return Err(FlowError::FlowInProgress(sender.to_owned()));
        }
        Ok(InFlightGuard {
            senders: Arc::clone(&self.senders),
            sender: sender.to_owned(),
        })
    }

    fn contains(&self, sender: &str) -> bool {
        self.senders
            .lock()
            .map(|g| g.contains(sender.trim()))
            .unwrap_or(false)
    }
}

struct InFlightGuard {
    senders: Arc<Mutex<HashSet<String>>>,
    sender: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut g) = self.senders.lock() {
            g.remove(&self.sender);
        }
    }
}
