//! 20-byte account / contract address.

use crate::error::TypesError;
use crate::hash::Hash32;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An account or contract address on the ledger.
///
/// [`Address::ZERO`] doubles as the "anyone" sentinel in role tables: a role
/// granted to the zero address is held by every account.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Take the last 20 bytes of a hash (the usual way contract addresses
    /// are derived).
    pub fn from_hash(hash: &Hash32) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash.as_bytes()[12..]);
        Self(bytes)
    }

    /// The address as a left-aligned 32-byte word (`bytes32(bytes20(addr))`).
    pub fn to_word(&self) -> Hash32 {
        let mut word = [0u8; 32];
        word[..20].copy_from_slice(&self.0);
        Hash32::new(word)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits).map_err(|_| TypesError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; 20] = raw
            .try_into()
            .map_err(|_| TypesError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}
