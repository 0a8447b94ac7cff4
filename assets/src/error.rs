use thiserror::Error;
use village_ledger::CallError;
use village_types::{Address, Amount, Timestamp};

#[derive(Debug, Error)]
pub enum AssetError {
    // ── Fisch ──
    #[error("token {0} does not exist")]
    NonexistentToken(u64),

    #[error("{caller} is not the owner of token {token_id}")]
    NotTokenOwner { token_id: u64, caller: Address },

    #[error("{caller} is neither owner nor approved for token {token_id}")]
    NotApproved { token_id: u64, caller: Address },

    #[error("transfer to the zero address")]
    TransferToZero,

    #[error("approval to current owner")]
    ApproveToOwner,

    // ── Loan ──
    #[error("loan {0} does not exist")]
    UnknownLoan(u64),

    #[error("borrow {0} does not exist")]
    UnknownBorrow(u64),

    #[error("caller is not the lender")]
    NotLender,

    #[error("caller is not the borrower")]
    NotBorrower,

    #[error("loan {0} is not active")]
    LoanInactive(u64),

    #[error("loan {0} is locked")]
    LoanLocked(u64),

    #[error("insufficient loan funds: available {available}, requested {requested}")]
    InsufficientLoanFunds { available: Amount, requested: Amount },

    #[error("interest rate {rate}% exceeds maximum {max}%")]
    InterestTooHigh { rate: u128, max: u128 },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("loan duration must be at least one month")]
    ZeroDuration,

    #[error("{borrower} does not own collateral token {token_id}")]
    CollateralNotOwned { token_id: u64, borrower: Address },

    #[error("token {0} has not been approved as collateral")]
    NotCollateral(u64),

    #[error("amount overflow")]
    Overflow,

    #[error("borrow {0} has not been approved")]
    BorrowNotApproved(u64),

    #[error("borrow {0} is already approved")]
    AlreadyApproved(u64),

    #[error("borrow {0} is already settled")]
    AlreadySettled(u64),

    #[error("loan not due until {due}, now {now}")]
    LoanNotDue { due: Timestamp, now: Timestamp },

    #[error("liquidation offer {offered} is below principal {principal}")]
    LiquidationTooLow { offered: Amount, principal: Amount },

    // ── Marketplace ──
    #[error("token {0} is already on auction")]
    AuctionExists(u64),

    #[error("no running auction for token {0}")]
    NoAuction(u64),

    #[error("token {0} can still be delivered to the winner")]
    AuctionDeliverable(u64),

    #[error("caller is not the seller")]
    NotSeller,

    #[error("end time {end_time} is not in the future")]
    InvalidEndTime { end_time: Timestamp },

    #[error("auction for token {0} has ended")]
    AuctionEnded(u64),

    #[error("auction for token {0} has not ended")]
    AuctionNotEnded(u64),

    #[error("bid {bid} below minimum {minimum}")]
    BidTooLow { bid: Amount, minimum: Amount },

    #[error("seller cannot bid on own auction")]
    SellerCannotBid,

    #[error("auction for token {0} is already resulted")]
    AuctionAlreadyResulted(u64),

    #[error("auction for token {0} has not been resulted")]
    AuctionNotResulted(u64),

    #[error("caller did not win the auction")]
    NotWinner,

    #[error("auction for token {0} is already confirmed")]
    AuctionAlreadyConfirmed(u64),
}

impl From<AssetError> for CallError {
    fn from(e: AssetError) -> Self {
        CallError::revert(e)
    }
}
