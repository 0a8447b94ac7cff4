use thiserror::Error;
use village_types::{Address, Amount};

/// Why a call was rejected.
///
/// Contract-specific failures travel as [`CallError::Revert`] and can be
/// recovered with [`CallError::reason`].
#[derive(Debug, Error)]
pub enum CallError {
    #[error("no contract deployed at {0}")]
    NoContract(Address),

    #[error("contract at {address} is not a {expected}")]
    WrongContract {
        address: Address,
        expected: &'static str,
    },

    #[error("re-entrant call into {0}")]
    Reentrancy(Address),

    #[error("call depth limit of {0} exceeded")]
    DepthExceeded(usize),

    #[error("insufficient balance in {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: Address,
        needed: Amount,
        available: Amount,
    },

    #[error("balance of {0} would overflow")]
    BalanceOverflow(Address),

    #[error("function is not payable")]
    NonPayable,

    #[error("malformed calldata: {0}")]
    Decode(String),

    #[error("Ownable: caller is not the owner")]
    NotOwner,

    #[error("Ownable: new owner is the zero address")]
    ZeroOwner,

    #[error("{0}")]
    Revert(Box<dyn std::error::Error + Send + Sync>),
}

impl CallError {
    /// Wrap a contract-level error.
    pub fn revert<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Revert(Box::new(err))
    }

    /// The contract-level reason, if this is a revert carrying an `E`.
    pub fn reason<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Revert(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}
