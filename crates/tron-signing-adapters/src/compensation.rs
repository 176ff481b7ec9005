use alloy::primitives::U256;
use async_trait::async_trait;
use tracing::info;

use tron_signing_core::{
    submit_contract_call, ChainClient, CompensationHook, CompensationOutcome, ContractCall,
    FlowError, FlowIntent, FlowStep, PortError, WalletPort,
};

/// Revokes the spender's allowance with `approve(spender, 0)` after a saga's
/// transfer leg failed. Holds its own handles to the chain and wallet, so
/// both must be cheap clones of the ones given to the orchestrator.
#[derive(Debug, Clone)]
pub struct RevokeAllowanceHook<C, W> {
    chain: C,
    wallet: W,
}

impl<C, W> RevokeAllowanceHook<C, W>
where
    C: ChainClient,
    W: WalletPort,
{
    pub fn new(chain: C, wallet: W) -> Self {
        Self { chain, wallet }
    }
}

#[async_trait]
impl<C, W> CompensationHook for RevokeAllowanceHook<C, W>
where
    C: ChainClient,
    W: WalletPort,
{
    async fn compensate(&self, intent: &FlowIntent) -> Result<CompensationOutcome, PortError> {
        let state = self.wallet.connection_state()?;
        match state.connected_address() {
            Some(address) if address == intent.sender => {}
            Some(other) => {
                return Ok(CompensationOutcome::Deferred {
                    reason: format!(
                        "connected account {other} does not own intent {}",
                        intent.intent_id
                    ),
                })
            }
            None => {
                return Ok(CompensationOutcome::Deferred {
                    reason: "wallet is not connected".to_owned(),
                })
            }
        }

        let call = ContractCall::approve(
            &intent.token_contract,
            &intent.spender_contract,
            U256::ZERO,
            intent.fee_limit,
            &intent.sender,
        );
        let receipt = submit_contract_call(&self.chain, &self.wallet, FlowStep::Revoke, &call)
            .await
            .map_err(into_port_error)?;
        info!(
            target: "adapters::compensation",
            intent_id = %intent.intent_id,
            txid = %receipt.txid,
            "allowance revoked"
        );
        Ok(CompensationOutcome::Compensated { txid: receipt.txid })
    }
}

fn into_port_error(err: FlowError) -> PortError {
    match err {
        FlowError::Port(e) => e,
        FlowError::WalletNotFound(msg) => PortError::NotFound(msg),
        FlowError::WalletDisconnected(msg) => PortError::Disconnected(msg),
        FlowError::SigningRejected { reason, .. } => PortError::Rejected(reason),
        other => PortError::Transport(other.to_string()),
    }
}
