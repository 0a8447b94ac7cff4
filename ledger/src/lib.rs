//! Simulated ledger for the VillageSquare DAO.
//!
//! A single, totally ordered ledger: every transaction runs in its own block
//! (automine), nested calls run depth-first, and a failed call restores every
//! piece of state it touched. Time and block height only move when a
//! transaction is mined or when the caller advances the clock explicitly.

pub mod clock;
pub mod codec;
pub mod context;
pub mod contract;
pub mod error;
pub mod event;
pub mod ledger;
pub mod ownable;

pub use clock::{BlockEnv, ChainClock};
pub use codec::{decode, encode};
pub use context::CallContext;
pub use contract::Contract;
pub use error::CallError;
pub use event::{EventBus, EventData, Log};
pub use ledger::{Deployed, Ledger, Receipt};
pub use ownable::{Ownable, OwnershipTransferred};
