//! Fundamental types for the VillageSquare DAO.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, 32-byte hashes, token amounts, block numbers, timestamps and network ids.

pub mod address;
pub mod amount;
pub mod block;
pub mod error;
pub mod hash;
pub mod network;
pub mod time;

pub use address::Address;
pub use amount::Amount;
pub use block::BlockNumber;
pub use error::TypesError;
pub use hash::{Hash32, OperationId, ProposalId, RoleId};
pub use network::NetworkId;
pub use time::Timestamp;
