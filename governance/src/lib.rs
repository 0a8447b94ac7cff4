//! The VillageSquare governor.
//!
//! Lifecycle: Pending → Active → {Defeated | Succeeded} → Queued → Executed,
//! with Canceled reachable from Pending/Active and Expired reachable from
//! Succeeded/Queued once their grace window passes.
//!
//! Vote weight is read from the token at the proposal's snapshot block, and
//! quorum is a percentage of total supply at that same block. Passed
//! proposals are scheduled on and executed through the lock controller.

pub mod counting;
pub mod error;
pub mod governor;
pub mod proposal;
pub mod settings;

pub use counting::{ProposalVote, VoteType};
pub use error::GovernorError;
pub use governor::{
    proposal_state, GovernorCall, ProposalCanceled, ProposalCreated, ProposalExecuted,
    ProposalQueued, VillageSquare, VoteCast,
};
pub use proposal::{hash_proposal, ProposalBatch, ProposalCore, ProposalState};
pub use settings::GovernorSettings;
