//! Hashing primitives for the VillageSquare DAO.
//!
//! - **Blake2b-256** for every identifier: proposal ids, timelock operation
//!   ids, role ids and description hashes
//! - Address derivation for development accounts and deployed contracts

pub mod address;
pub mod hash;

pub use address::{contract_address, dev_account};
pub use hash::{hash_bytes, hash_parts, hash_text};
