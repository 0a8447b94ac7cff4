//! Governance token for the VillageSquare DAO.
//!
//! `CowriesToken` is a fungible token whose holders delegate voting power.
//! Every change in a delegate's votes (and in total supply) is recorded as a
//! per-block checkpoint, so the governor can read voting power as it was at
//! a proposal's snapshot block rather than as it is now.

pub mod checkpoints;
pub mod error;
pub mod token;

pub use checkpoints::{Checkpoint, Checkpoints};
pub use error::TokenError;
pub use token::{
    Approval, CowriesToken, DelegateChanged, DelegateVotesChanged, TokenCall, Transfer,
};
