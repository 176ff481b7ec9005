//! Build -> sign -> broadcast, fail-fast, for a single transaction.

use tracing::{debug, info, warn};

use crate::domain::{ContractCall, FlowStep, StepReceipt, UnsignedTransaction};
use crate::error::FlowError;
use crate::ports::{ChainClient, WalletPort};

pub async fn submit_contract_call<C, W>(
    chain: &C,
    wallet: &W,
    step: FlowStep,
    call: &ContractCall,
) -> Result<StepReceipt, FlowError>
where
    C: ChainClient + ?Sized,
    W: WalletPort + ?Sized,
{
    call.validate()
        .map_err(|e| FlowError::TransactionBuild {
            step,
            reason: e.to_string(),
        })?;

    let built = chain
        .trigger_smart_contract(call)
        .await
        .map_err(|e| FlowError::TransactionBuild {
            step,
            reason: e.to_string(),
        })?;
    let tx = built
        .into_transaction()
        .map_err(|reason| FlowError::TransactionBuild { step, reason })?;
    debug!(
        target: "flow::pipeline",
        %step,
        contract = %call.contract_address,
        method = %call.method_signature,
        txid = %tx.txid,
        raw_data = %tx.raw_data,
        "built transaction"
    );

    sign_and_broadcast(chain, wallet, step, tx).await
}

pub async fn sign_and_broadcast<C, W>(
    chain: &C,
    wallet: &W,
    step: FlowStep,
    tx: UnsignedTransaction,
) -> Result<StepReceipt, FlowError>
where
    C: ChainClient + ?Sized,
    W: WalletPort + ?Sized,
{
    let signed = wallet
        .sign_transaction(&tx)
        .await
        .map_err(|e| FlowError::from_wallet(Some(step), e))?;
    if !signed.has_signature() {
        warn!(target: "flow::pipeline", %step, txid = %tx.txid, "signer returned no signature");
        return Err(FlowError::SigningRejected {
            step,
            reason: "signed transaction carries no signature".to_owned(),
        });
    }
    debug!(
        target: "flow::pipeline",
        %step,
        txid = %signed.txid(),
        signatures = signed.signature.len(),
        "signed transaction"
    );

    let result = chain.send_raw_transaction(&signed).await?;
    if !result.result {
        warn!(
            target: "flow::pipeline",
            %step,
            txid = %signed.txid(),
            payload = %result.raw,
            "broadcast rejected"
        );
        return Err(FlowError::Broadcast {
            step,
            payload: result.raw,
        });
    }

    let txid = result
        .txid
        .clone()
        .unwrap_or_else(|| signed.txid().to_owned());
    info!(target: "flow::pipeline", %step, %txid, "broadcast accepted");
    Ok(StepReceipt {
        step,
        txid,
        broadcast: result,
    })
}
