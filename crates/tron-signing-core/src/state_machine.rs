use serde::{Deserialize, Serialize};

use crate::ports::PortError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SagaPhase {
    Recorded,
    Approving,
    Approved,
    Transferring,
    Completed,
    Failed,
    CompensationPending,
    Compensated,
}

impl SagaPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaPhase::Completed | SagaPhase::Failed | SagaPhase::Compensated
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaAction {
    StartApprove,
    ApproveConfirmed,
    StartTransfer,
    TransferConfirmed,
    Fail,
    RequestCompensation,
    CompensationConfirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SagaPhase,
    pub to: SagaPhase,
    pub reason: &'static str,
}

pub fn saga_transition(
    from: SagaPhase,
    action: SagaAction,
) -> Result<(SagaPhase, StateTransition), PortError> {
    use SagaAction as A;
    use SagaPhase as P;

    let (to, reason) = match (from, action) {
        (P::Recorded, A::StartApprove) => (P::Approving, "approve_started"),
        (P::Recorded, A::Fail) => (P::Failed, "rejected_before_approve"),
        (P::Approving, A::ApproveConfirmed) => (P::Approved, "approve_broadcast"),
        (P::Approving, A::Fail) => (P::Failed, "approve_failed"),
        (P::Approved, A::StartTransfer) => (P::Transferring, "transfer_started"),
        (P::Transferring, A::TransferConfirmed) => (P::Completed, "transfer_broadcast"),
        // approve already landed on-chain, so a failed transfer cannot just fail
        (P::Transferring, A::RequestCompensation) => {
            (P::CompensationPending, "transfer_failed_after_approve")
        }
        (P::CompensationPending, A::CompensationConfirmed) => {
            (P::Compensated, "compensation_broadcast")
        }
        _ => {
            return Err(PortError::Validation(format!(
                "illegal saga transition: {from:?} -> {action:?}"
            )))
        }
    };

    Ok((to, StateTransition { from, to, reason }))
}
