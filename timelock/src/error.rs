use thiserror::Error;
use village_ledger::CallError;
use village_types::{Address, OperationId, RoleId, Timestamp};

#[derive(Debug, Error)]
pub enum TimelockError {
    #[error("account {account} is missing role {role}")]
    Unauthorized { account: Address, role: RoleId },

    #[error("insufficient delay: {requested}s < minimum {minimum}s")]
    DelayTooShort { requested: u64, minimum: u64 },

    #[error("operation {0} is already scheduled")]
    OperationAlreadyScheduled(OperationId),

    #[error("operation batch is empty or malformed")]
    InvalidOperationLength,

    #[error("operation {0} was never scheduled")]
    UnknownOperation(OperationId),

    #[error("operation {id} is not ready: ready at {ready_at}, now {now}")]
    NotReady {
        id: OperationId,
        ready_at: Timestamp,
        now: Timestamp,
    },

    #[error("operation {0} has already been executed")]
    AlreadyExecuted(OperationId),

    #[error("predecessor operation {0} has not been executed")]
    PredecessorNotExecuted(OperationId),

    #[error("call {index} of the operation reverted: {source}")]
    OperationReverted {
        index: usize,
        #[source]
        source: CallError,
    },

    #[error("operation {0} cannot be cancelled")]
    NotCancellable(OperationId),

    #[error("caller must be the timelock itself")]
    OnlySelf,

    #[error("roles can only be renounced for self")]
    RenounceForOther,
}

impl From<TimelockError> for CallError {
    fn from(e: TimelockError) -> Self {
        CallError::revert(e)
    }
}
