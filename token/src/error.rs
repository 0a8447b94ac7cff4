use thiserror::Error;
use village_ledger::CallError;
use village_types::{Address, Amount, BlockNumber};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("insufficient balance in {account}: have {have}, need {need}")]
    InsufficientBalance {
        account: Address,
        have: Amount,
        need: Amount,
    },

    #[error("insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: Amount, need: Amount },

    #[error("transfer to the zero address")]
    TransferToZero,

    #[error("lookup of block {requested} is not yet mined (current {current})")]
    FutureLookup {
        requested: BlockNumber,
        current: BlockNumber,
    },

    #[error("total supply overflow")]
    SupplyOverflow,
}

impl From<TokenError> for CallError {
    fn from(e: TokenError) -> Self {
        CallError::revert(e)
    }
}
