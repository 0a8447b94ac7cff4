//! Calldata, return data and event payload encoding.
//!
//! Contracts exchange bincode-encoded serde values: a call enum per contract
//! plays the role of the ABI function selector plus arguments.

use crate::error::CallError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value as calldata / return data.
pub fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    bincode::serialize(value).expect("in-memory values are always bincode-serializable")
}

/// Decode calldata / return data, failing with [`CallError::Decode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CallError> {
    bincode::deserialize(bytes).map_err(|e| CallError::Decode(e.to_string()))
}
