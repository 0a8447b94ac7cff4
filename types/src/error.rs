use thiserror::Error;

/// Parsing errors for the fundamental types.
#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid 32-byte hash: {0}")]
    InvalidHash(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}
