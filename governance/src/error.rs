use thiserror::Error;
use village_ledger::CallError;
use village_token::TokenError;
use village_types::{Address, Amount, ProposalId, Timestamp};

use crate::proposal::ProposalState;

#[derive(Debug, Error)]
pub enum GovernorError {
    #[error("invalid proposal length: {targets} targets, {values} values, {calldatas} calldatas")]
    InvalidProposalLength {
        targets: usize,
        values: usize,
        calldatas: usize,
    },

    #[error("proposer votes below threshold: {votes} < {threshold}")]
    InsufficientProposerVotes { votes: Amount, threshold: Amount },

    #[error("proposal {0} already exists")]
    DuplicateProposal(ProposalId),

    #[error("unknown proposal {0}")]
    UnknownProposal(ProposalId),

    #[error("proposal {id} is not active (state {state:?})")]
    ProposalNotActive { id: ProposalId, state: ProposalState },

    #[error("{voter} has already voted on proposal {id}")]
    AlreadyVoted { voter: Address, id: ProposalId },

    #[error("proposal {id} has not succeeded (state {state:?})")]
    ProposalNotSucceeded { id: ProposalId, state: ProposalState },

    #[error("proposal {id} is not queued (state {state:?})")]
    ProposalNotQueued { id: ProposalId, state: ProposalState },

    #[error("proposal {0} has already been executed")]
    AlreadyExecuted(ProposalId),

    #[error("timelock not ready for proposal {id}: eta {eta}, now {now}")]
    TimelockNotReady {
        id: ProposalId,
        eta: Timestamp,
        now: Timestamp,
    },

    #[error("proposal {id} cannot be canceled (state {state:?})")]
    ProposalNotCancellable { id: ProposalId, state: ProposalState },

    #[error("only the proposer can cancel a proposal")]
    NotProposer,

    #[error("invalid governor settings: {0}")]
    InvalidSettings(String),

    #[error("token lookup failed: {0}")]
    Token(#[from] TokenError),
}

impl From<GovernorError> for CallError {
    fn from(e: GovernorError) -> Self {
        CallError::revert(e)
    }
}
