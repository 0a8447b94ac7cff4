//! Network identifier.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies which network a deployment targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// In-process development chain.
    Hardhat,
    /// A development node on localhost.
    Localhost,
    /// Polygon Mumbai test network.
    Mumbai,
    /// Polygon main network.
    Polygon,
}

impl NetworkId {
    /// EIP-155 chain id.
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Hardhat | Self::Localhost => 31337,
            Self::Mumbai => 80001,
            Self::Polygon => 137,
        }
    }

    /// Development chains never get source verification and confirm in one block.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Hardhat | Self::Localhost)
    }

    /// Blocks to wait after each deployment transaction.
    pub fn default_confirmations(&self) -> u64 {
        match self {
            Self::Hardhat | Self::Localhost => 1,
            Self::Mumbai | Self::Polygon => 6,
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hardhat => "hardhat",
            Self::Localhost => "localhost",
            Self::Mumbai => "mumbai",
            Self::Polygon => "polygon",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hardhat" => Ok(Self::Hardhat),
            "localhost" => Ok(Self::Localhost),
            "mumbai" => Ok(Self::Mumbai),
            "polygon" => Ok(Self::Polygon),
            _ => Err(TypesError::UnknownNetwork(s.to_string())),
        }
    }
}
