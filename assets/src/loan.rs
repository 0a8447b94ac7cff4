//! Collateralised lending against Fisch NFTs.
//!
//! A lender lists a loan funded with native value. A borrower who owns a
//! collateral-approved Fisch requests a borrow; once the lender approves it
//! the principal is paid out and the debt (principal plus flat interest)
//! falls due after the loan's duration. Unpaid debt past its due date can be
//! liquidated: the liquidator pays at least the principal to the lender and
//! receives the NFT, which requires this contract to be an approved operator
//! of the borrower's tokens.

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use village_ledger::{codec, CallContext, CallError, Contract, EventData, Ownable};
use village_types::{Address, Amount, Timestamp};

use crate::error::AssetError;
use crate::fisch::{Fisch, FischCall};

/// Length of a loan month.
pub const SECONDS_PER_MONTH: u64 = 30 * 24 * 3600;

const DEFAULT_MAX_INTEREST_PERCENT: u128 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanListing {
    pub loan_id: u64,
    pub lender: Address,
    pub interest_percent: u128,
    pub duration_months: u64,
    pub initial_lend_amount: Amount,
    /// Funds not yet paid out to borrowers.
    pub available: Amount,
    pub is_active: bool,
    pub locked: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub borrow_id: u64,
    pub loan_id: u64,
    pub borrower: Address,
    pub nft_id: u64,
    pub initial_borrow_amount: Amount,
    /// Outstanding debt; set to principal plus interest on approval.
    pub current_borrow_amount: Amount,
    pub amount_already_remitted: Amount,
    pub due: Option<Timestamp>,
    pub is_approved: bool,
    pub is_repaid: bool,
    pub liquidated: bool,
}

impl BorrowRecord {
    fn is_settled(&self) -> bool {
        self.is_repaid || self.liquidated
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanListed {
    pub loan_id: u64,
    pub lender: Address,
    pub amount: Amount,
    pub interest_percent: u128,
    pub duration_months: u64,
}

impl EventData for LoanListed {
    const NAME: &'static str = "LoanListed";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanFunded {
    pub loan_id: u64,
    pub amount: Amount,
}

impl EventData for LoanFunded {
    const NAME: &'static str = "LoanFunded";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanLockChanged {
    pub loan_id: u64,
    pub locked: bool,
}

impl EventData for LoanLockChanged {
    const NAME: &'static str = "LoanLockChanged";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCancelled {
    pub loan_id: u64,
    pub refunded: Amount,
}

impl EventData for LoanCancelled {
    const NAME: &'static str = "LoanCancelled";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRequested {
    pub borrow_id: u64,
    pub loan_id: u64,
    pub borrower: Address,
    pub nft_id: u64,
    pub amount: Amount,
}

impl EventData for BorrowRequested {
    const NAME: &'static str = "BorrowRequested";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowApproved {
    pub borrow_id: u64,
    pub debt: Amount,
    pub due: Timestamp,
}

impl EventData for BorrowApproved {
    const NAME: &'static str = "BorrowApproved";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRepaid {
    pub borrow_id: u64,
    pub amount: Amount,
    pub remaining: Amount,
}

impl EventData for LoanRepaid {
    const NAME: &'static str = "LoanRepaid";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralLiquidated {
    pub borrow_id: u64,
    pub nft_id: u64,
    pub liquidator: Address,
    pub amount: Amount,
    pub sale: String,
}

impl EventData for CollateralLiquidated {
    const NAME: &'static str = "CollateralLiquidated";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxInterestRateChanged {
    pub old_rate: u128,
    pub new_rate: u128,
}

impl EventData for MaxInterestRateChanged {
    const NAME: &'static str = "MaxInterestRateChanged";
}

/// Calldata accepted by [`Loan`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LoanCall {
    CreateOrListLoan {
        interest_percent: u128,
        duration_months: u64,
    },
    AddFunds {
        loan_id: u64,
    },
    LockLoan {
        loan_id: u64,
    },
    UnlockLoan {
        loan_id: u64,
    },
    CancelLoan {
        loan_id: u64,
    },
    Borrow {
        loan_id: u64,
        amount: Amount,
        nft_id: u64,
        borrower: Address,
    },
    ApproveLoan {
        borrow_id: u64,
    },
    RepayLoan {
        borrow_id: u64,
    },
    LiquidateCollateral {
        borrow_id: u64,
        sale: String,
    },
    SetMaxInterestRate {
        rate: u128,
    },
    TransferOwnership {
        new_owner: Address,
    },
}

impl LoanCall {
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }
}

#[derive(Clone, Debug)]
pub struct Loan {
    ownable: Ownable,
    fisch: Address,
    max_interest_percent: u128,
    loans: BTreeMap<u64, LoanListing>,
    borrows: BTreeMap<u64, BorrowRecord>,
}

impl Loan {
    pub fn new(fisch: Address) -> Self {
        Self {
            ownable: Ownable::default(),
            fisch,
            max_interest_percent: DEFAULT_MAX_INTEREST_PERCENT,
            loans: BTreeMap::new(),
            borrows: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn fisch(&self) -> Address {
        self.fisch
    }

    pub fn max_interest_rate(&self) -> u128 {
        self.max_interest_percent
    }

    pub fn loan_count(&self) -> u64 {
        self.loans.len() as u64
    }

    pub fn fetch_loan_single(&self, loan_id: u64) -> Result<&LoanListing, AssetError> {
        self.loans.get(&loan_id).ok_or(AssetError::UnknownLoan(loan_id))
    }

    pub fn fetch_borrow_single(&self, borrow_id: u64) -> Result<&BorrowRecord, AssetError> {
        self.borrows
            .get(&borrow_id)
            .ok_or(AssetError::UnknownBorrow(borrow_id))
    }

    fn lender_listing(&mut self, loan_id: u64, caller: Address) -> Result<&mut LoanListing, AssetError> {
        let listing = self
            .loans
            .get_mut(&loan_id)
            .ok_or(AssetError::UnknownLoan(loan_id))?;
        if listing.lender != caller {
            return Err(AssetError::NotLender);
        }
        if !listing.is_active {
            return Err(AssetError::LoanInactive(loan_id));
        }
        Ok(listing)
    }

    fn open_borrow(&self, borrow_id: u64) -> Result<&BorrowRecord, AssetError> {
        let record = self.fetch_borrow_single(borrow_id)?;
        if !record.is_approved {
            return Err(AssetError::BorrowNotApproved(borrow_id));
        }
        if record.is_settled() {
            return Err(AssetError::AlreadySettled(borrow_id));
        }
        Ok(record)
    }

    fn set_locked(&mut self, ctx: &mut CallContext<'_>, loan_id: u64, locked: bool) -> Result<(), AssetError> {
        self.lender_listing(loan_id, ctx.sender())?.locked = locked;
        debug!(loan_id, locked, "loan lock changed");
        ctx.emit(&LoanLockChanged { loan_id, locked });
        Ok(())
    }

    /// Look up the current owner and collateral flag of a Fisch token.
    fn collateral_status(&self, ctx: &CallContext<'_>, nft_id: u64) -> Result<(Address, bool), CallError> {
        let fisch = ctx.view::<Fisch>(self.fisch)?;
        Ok((fisch.owner_of(nft_id)?, fisch.is_collateral(nft_id)))
    }

    fn create(
        &mut self,
        ctx: &mut CallContext<'_>,
        interest_percent: u128,
        duration_months: u64,
    ) -> Result<u64, AssetError> {
        if interest_percent > self.max_interest_percent {
            return Err(AssetError::InterestTooHigh {
                rate: interest_percent,
                max: self.max_interest_percent,
            });
        }
        if duration_months == 0 {
            return Err(AssetError::ZeroDuration);
        }
        let loan_id = self.loans.len() as u64 + 1;
        let lender = ctx.sender();
        let amount = ctx.value();
        self.loans.insert(
            loan_id,
            LoanListing {
                loan_id,
                lender,
                interest_percent,
                duration_months,
                initial_lend_amount: amount,
                available: amount,
                is_active: true,
                locked: false,
            },
        );
        info!(loan_id, lender = %lender, amount = %amount, "loan listed");
        ctx.emit(&LoanListed {
            loan_id,
            lender,
            amount,
            interest_percent,
            duration_months,
        });
        Ok(loan_id)
    }

    fn borrow(
        &mut self,
        ctx: &mut CallContext<'_>,
        loan_id: u64,
        amount: Amount,
        nft_id: u64,
        borrower: Address,
    ) -> Result<u64, CallError> {
        if ctx.sender() != borrower {
            return Err(AssetError::NotBorrower.into());
        }
        if amount.is_zero() {
            return Err(AssetError::ZeroAmount.into());
        }
        let listing = self.fetch_loan_single(loan_id)?;
        if !listing.is_active {
            return Err(AssetError::LoanInactive(loan_id).into());
        }
        if listing.locked {
            return Err(AssetError::LoanLocked(loan_id).into());
        }
        if listing.available < amount {
            return Err(AssetError::InsufficientLoanFunds {
                available: listing.available,
                requested: amount,
            }
            .into());
        }
        let (owner, is_collateral) = self.collateral_status(ctx, nft_id)?;
        if owner != borrower {
            return Err(AssetError::CollateralNotOwned {
                token_id: nft_id,
                borrower,
            }
            .into());
        }
        if !is_collateral {
            return Err(AssetError::NotCollateral(nft_id).into());
        }

        let borrow_id = self.borrows.len() as u64 + 1;
        self.borrows.insert(
            borrow_id,
            BorrowRecord {
                borrow_id,
                loan_id,
                borrower,
                nft_id,
                initial_borrow_amount: amount,
                current_borrow_amount: amount,
                amount_already_remitted: Amount::ZERO,
                due: None,
                is_approved: false,
                is_repaid: false,
                liquidated: false,
            },
        );
        debug!(borrow_id, loan_id, borrower = %borrower, "borrow requested");
        ctx.emit(&BorrowRequested {
            borrow_id,
            loan_id,
            borrower,
            nft_id,
            amount,
        });
        Ok(borrow_id)
    }

    fn approve(&mut self, ctx: &mut CallContext<'_>, borrow_id: u64) -> Result<(), CallError> {
        let record = self.fetch_borrow_single(borrow_id)?.clone();
        if record.is_approved {
            return Err(AssetError::AlreadyApproved(borrow_id).into());
        }
        let (owner, _) = self.collateral_status(ctx, record.nft_id)?;
        if owner != record.borrower {
            return Err(AssetError::CollateralNotOwned {
                token_id: record.nft_id,
                borrower: record.borrower,
            }
            .into());
        }

        let now = ctx.block().timestamp;
        let listing = self.lender_listing(record.loan_id, ctx.sender())?;
        let principal = record.initial_borrow_amount;
        listing.available = listing
            .available
            .checked_sub(principal)
            .ok_or(AssetError::InsufficientLoanFunds {
                available: listing.available,
                requested: principal,
            })?;
        let debt = listing
            .interest_percent
            .checked_add(100)
            .and_then(|rate| principal.mul_div(rate, 100))
            .ok_or(AssetError::Overflow)?;
        let due = now.plus_secs(listing.duration_months.saturating_mul(SECONDS_PER_MONTH));

        if let Some(record) = self.borrows.get_mut(&borrow_id) {
            record.is_approved = true;
            record.current_borrow_amount = debt;
            record.due = Some(due);
        }
        ctx.transfer(record.borrower, principal)?;
        info!(borrow_id, debt = %debt, due = %due, "borrow approved");
        ctx.emit(&BorrowApproved {
            borrow_id,
            debt,
            due,
        });
        Ok(())
    }

    fn repay(&mut self, ctx: &mut CallContext<'_>, borrow_id: u64) -> Result<(), CallError> {
        let record = self.open_borrow(borrow_id)?;
        if record.borrower != ctx.sender() {
            return Err(AssetError::NotBorrower.into());
        }
        let paid = ctx.value();
        if paid.is_zero() {
            return Err(AssetError::ZeroAmount.into());
        }
        let lender = self.fetch_loan_single(record.loan_id)?.lender;
        let applied = paid.min(record.current_borrow_amount);
        let refund = paid - applied;

        let record = self
            .borrows
            .get_mut(&borrow_id)
            .ok_or(AssetError::UnknownBorrow(borrow_id))?;
        record.current_borrow_amount = record.current_borrow_amount - applied;
        record.amount_already_remitted = record
            .amount_already_remitted
            .checked_add(applied)
            .ok_or(AssetError::Overflow)?;
        record.is_repaid = record.current_borrow_amount.is_zero();
        let remaining = record.current_borrow_amount;
        let borrower = record.borrower;

        ctx.transfer(lender, applied)?;
        ctx.transfer(borrower, refund)?;
        debug!(borrow_id, applied = %applied, remaining = %remaining, "loan repayment");
        ctx.emit(&LoanRepaid {
            borrow_id,
            amount: applied,
            remaining,
        });
        Ok(())
    }

    fn liquidate(&mut self, ctx: &mut CallContext<'_>, borrow_id: u64, sale: String) -> Result<(), CallError> {
        let record = self.open_borrow(borrow_id)?.clone();
        let now = ctx.block().timestamp;
        let due = record.due.unwrap_or(now);
        if now < due {
            return Err(AssetError::LoanNotDue { due, now }.into());
        }
        let offered = ctx.value();
        if offered < record.initial_borrow_amount {
            return Err(AssetError::LiquidationTooLow {
                offered,
                principal: record.initial_borrow_amount,
            }
            .into());
        }
        let lender = self.fetch_loan_single(record.loan_id)?.lender;
        let liquidator = ctx.sender();

        let transfer = FischCall::TransferFrom {
            from: record.borrower,
            to: liquidator,
            token_id: record.nft_id,
        };
        ctx.call(self.fisch, Amount::ZERO, &transfer.encode())?;
        ctx.transfer(lender, offered)?;

        if let Some(record) = self.borrows.get_mut(&borrow_id) {
            record.current_borrow_amount = Amount::ZERO;
            record.liquidated = true;
        }
        info!(borrow_id, nft_id = record.nft_id, liquidator = %liquidator, sale = %sale, "collateral liquidated");
        ctx.emit(&CollateralLiquidated {
            borrow_id,
            nft_id: record.nft_id,
            liquidator,
            amount: offered,
            sale,
        });
        Ok(())
    }
}

impl Contract for Loan {
    fn name(&self) -> &'static str {
        "Loan"
    }

    fn deployed(&mut self, ctx: &mut CallContext<'_>) -> Result<(), CallError> {
        self.ownable.initialize(ctx);
        Ok(())
    }

    fn handle(&mut self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, CallError> {
        let call = codec::decode::<LoanCall>(calldata)?;
        let payable = matches!(
            call,
            LoanCall::CreateOrListLoan { .. }
                | LoanCall::AddFunds { .. }
                | LoanCall::RepayLoan { .. }
                | LoanCall::LiquidateCollateral { .. }
        );
        if !payable {
            ctx.require_no_value()?;
        }
        let caller = ctx.sender();

        match call {
            LoanCall::CreateOrListLoan {
                interest_percent,
                duration_months,
            } => {
                let loan_id = self.create(ctx, interest_percent, duration_months)?;
                return Ok(codec::encode(&loan_id));
            }
            LoanCall::AddFunds { loan_id } => {
                let amount = ctx.value();
                if amount.is_zero() {
                    return Err(AssetError::ZeroAmount.into());
                }
                let listing = self.lender_listing(loan_id, caller)?;
                listing.available = listing.available.checked_add(amount).ok_or(AssetError::Overflow)?;
                ctx.emit(&LoanFunded { loan_id, amount });
            }
            LoanCall::LockLoan { loan_id } => self.set_locked(ctx, loan_id, true)?,
            LoanCall::UnlockLoan { loan_id } => self.set_locked(ctx, loan_id, false)?,
            LoanCall::CancelLoan { loan_id } => {
                let listing = self.lender_listing(loan_id, caller)?;
                let refunded = std::mem::take(&mut listing.available);
                listing.is_active = false;
                ctx.transfer(caller, refunded)?;
                info!(loan_id, refunded = %refunded, "loan cancelled");
                ctx.emit(&LoanCancelled { loan_id, refunded });
            }
            LoanCall::Borrow {
                loan_id,
                amount,
                nft_id,
                borrower,
            } => {
                let borrow_id = self.borrow(ctx, loan_id, amount, nft_id, borrower)?;
                return Ok(codec::encode(&borrow_id));
            }
            LoanCall::ApproveLoan { borrow_id } => self.approve(ctx, borrow_id)?,
            LoanCall::RepayLoan { borrow_id } => self.repay(ctx, borrow_id)?,
            LoanCall::LiquidateCollateral { borrow_id, sale } => self.liquidate(ctx, borrow_id, sale)?,
            LoanCall::SetMaxInterestRate { rate } => {
                self.ownable.only_owner(caller)?;
                let old_rate = std::mem::replace(&mut self.max_interest_percent, rate);
                ctx.emit(&MaxInterestRateChanged {
                    old_rate,
                    new_rate: rate,
                });
            }
            LoanCall::TransferOwnership { new_owner } => self.ownable.transfer_ownership(ctx, new_owner)?,
        }
        Ok(Vec::new())
    }

    fn clone_box(&self) -> Box<dyn Contract> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fisch::DigitalAsset;
    use village_ledger::Ledger;

    fn wallet(n: u8) -> Address {
        Address::new([n; 20])
    }

    struct Market {
        ledger: Ledger,
        fisch: Address,
        loan: Address,
        lender: Address,
        borrower: Address,
    }

    impl Market {
        /// Fisch and Loan owned by `wallet(1)`; the borrower holds token 0,
        /// approved as collateral, with the loan contract as operator.
        fn new() -> Self {
            let mut ledger = Ledger::new(Timestamp::new(1_000));
            let admin = wallet(1);
            let lender = wallet(2);
            let borrower = wallet(3);
            ledger.fund(lender, Amount::ether(1_000));
            ledger.fund(borrower, Amount::ether(1_000));
            ledger.fund(wallet(4), Amount::ether(1_000));

            let fisch = ledger.deploy(admin, Fisch::new()).unwrap().address;
            let loan = ledger.deploy(admin, Loan::new(fisch)).unwrap().address;
            let mint = FischCall::MintNft(DigitalAsset {
                title: "Shop".into(),
                ..DigitalAsset::default()
            });
            ledger.transact(borrower, fisch, Amount::ZERO, &mint.encode()).unwrap();
            ledger
                .transact(admin, fisch, Amount::ZERO, &FischCall::MakeNftCollateral { token_id: 0 }.encode())
                .unwrap();
            let operator = FischCall::SetApprovalForAll {
                operator: loan,
                approved: true,
            };
            ledger.transact(borrower, fisch, Amount::ZERO, &operator.encode()).unwrap();
            Self {
                ledger,
                fisch,
                loan,
                lender,
                borrower,
            }
        }

        fn send(&mut self, from: Address, value: Amount, call: LoanCall) -> Result<Vec<u8>, CallError> {
            self.ledger
                .transact(from, self.loan, value, &call.encode())
                .map(|r| r.return_data)
        }

        fn contract(&self) -> &Loan {
            self.ledger.contract::<Loan>(self.loan).unwrap()
        }

        /// Listing 1 with 100 ether at 5% over 13 months, borrow 1 of 5 ether.
        fn approved_borrow(&mut self) {
            let create = LoanCall::CreateOrListLoan {
                interest_percent: 5,
                duration_months: 13,
            };
            self.send(self.lender, Amount::ether(100), create).unwrap();
            let borrow = LoanCall::Borrow {
                loan_id: 1,
                amount: Amount::ether(5),
                nft_id: 0,
                borrower: self.borrower,
            };
            self.send(self.borrower, Amount::ZERO, borrow).unwrap();
            self.send(self.lender, Amount::ZERO, LoanCall::ApproveLoan { borrow_id: 1 })
                .unwrap();
        }
    }

    fn asset_err(err: CallError) -> AssetError {
        match err {
            CallError::Revert(inner) => *inner.downcast::<AssetError>().unwrap(),
            other => panic!("expected revert, got {other}"),
        }
    }

    #[test]
    fn create_loan_records_listing() {
        let mut m = Market::new();
        let create = LoanCall::CreateOrListLoan {
            interest_percent: 5,
            duration_months: 13,
        };
        let id = m.send(m.lender, Amount::ether(100), create).unwrap();
        assert_eq!(codec::decode::<u64>(&id).unwrap(), 1);

        let listing = m.contract().fetch_loan_single(1).unwrap();
        assert_eq!(listing.duration_months, 13);
        assert_eq!(listing.available, Amount::ether(100));
        assert!(listing.is_active);
        assert_eq!(m.ledger.balance_of(m.loan), Amount::ether(100));
    }

    #[test]
    fn interest_above_cap_is_rejected() {
        let mut m = Market::new();
        let create = LoanCall::CreateOrListLoan {
            interest_percent: 101,
            duration_months: 1,
        };
        let err = m.send(m.lender, Amount::ether(1), create).unwrap_err();
        assert!(matches!(asset_err(err), AssetError::InterestTooHigh { rate: 101, max: 100 }));

        let err = m
            .send(m.lender, Amount::ZERO, LoanCall::SetMaxInterestRate { rate: 200 })
            .unwrap_err();
        assert!(matches!(err, CallError::NotOwner));
    }

    #[test]
    fn approving_at_unbounded_rate_reverts_with_overflow() {
        let mut m = Market::new();
        m.send(wallet(1), Amount::ZERO, LoanCall::SetMaxInterestRate { rate: u128::MAX })
            .unwrap();
        let create = LoanCall::CreateOrListLoan {
            interest_percent: u128::MAX,
            duration_months: 1,
        };
        m.send(m.lender, Amount::ether(10), create).unwrap();
        let borrow = LoanCall::Borrow {
            loan_id: 1,
            amount: Amount::ether(1),
            nft_id: 0,
            borrower: m.borrower,
        };
        m.send(m.borrower, Amount::ZERO, borrow).unwrap();

        let err = m
            .send(m.lender, Amount::ZERO, LoanCall::ApproveLoan { borrow_id: 1 })
            .unwrap_err();
        assert!(matches!(asset_err(err), AssetError::Overflow));
        assert!(!m.contract().fetch_borrow_single(1).unwrap().is_approved);
        assert_eq!(m.contract().fetch_loan_single(1).unwrap().available, Amount::ether(10));
    }

    #[test]
    fn borrow_then_approve_pays_out_principal() {
        let mut m = Market::new();
        let before = m.ledger.balance_of(m.borrower);
        m.approved_borrow();

        let record = m.contract().fetch_borrow_single(1).unwrap().clone();
        assert!(record.is_approved);
        assert_eq!(record.initial_borrow_amount, Amount::ether(5));
        assert_eq!(record.current_borrow_amount, Amount::new(5_250_000_000_000_000_000));
        let approved_at = m.ledger.block().timestamp;
        assert_eq!(record.due, Some(approved_at.plus_secs(13 * SECONDS_PER_MONTH)));
        assert_eq!(m.ledger.balance_of(m.borrower), before + Amount::ether(5));
        assert_eq!(m.contract().fetch_loan_single(1).unwrap().available, Amount::ether(95));
    }

    #[test]
    fn borrow_requires_owned_collateral() {
        let mut m = Market::new();
        let create = LoanCall::CreateOrListLoan {
            interest_percent: 5,
            duration_months: 1,
        };
        m.send(m.lender, Amount::ether(10), create).unwrap();

        let stranger = wallet(4);
        let borrow = LoanCall::Borrow {
            loan_id: 1,
            amount: Amount::ether(1),
            nft_id: 0,
            borrower: stranger,
        };
        let err = m.send(stranger, Amount::ZERO, borrow).unwrap_err();
        assert!(matches!(asset_err(err), AssetError::CollateralNotOwned { token_id: 0, .. }));

        let on_behalf = LoanCall::Borrow {
            loan_id: 1,
            amount: Amount::ether(1),
            nft_id: 0,
            borrower: m.borrower,
        };
        let err = m.send(stranger, Amount::ZERO, on_behalf).unwrap_err();
        assert!(matches!(asset_err(err), AssetError::NotBorrower));

        let too_much = LoanCall::Borrow {
            loan_id: 1,
            amount: Amount::ether(11),
            nft_id: 0,
            borrower: m.borrower,
        };
        let err = m.send(m.borrower, Amount::ZERO, too_much).unwrap_err();
        assert!(matches!(asset_err(err), AssetError::InsufficientLoanFunds { .. }));
    }

    #[test]
    fn locked_and_cancelled_loans_refuse_borrows() {
        let mut m = Market::new();
        let create = LoanCall::CreateOrListLoan {
            interest_percent: 5,
            duration_months: 1,
        };
        m.send(m.lender, Amount::ether(10), create).unwrap();
        let borrow = LoanCall::Borrow {
            loan_id: 1,
            amount: Amount::ether(1),
            nft_id: 0,
            borrower: m.borrower,
        };

        m.send(m.lender, Amount::ZERO, LoanCall::LockLoan { loan_id: 1 }).unwrap();
        let err = m.send(m.borrower, Amount::ZERO, borrow.clone()).unwrap_err();
        assert!(matches!(asset_err(err), AssetError::LoanLocked(1)));

        m.send(m.lender, Amount::ZERO, LoanCall::UnlockLoan { loan_id: 1 }).unwrap();
        m.send(m.lender, Amount::ether(5), LoanCall::AddFunds { loan_id: 1 }).unwrap();
        assert_eq!(m.contract().fetch_loan_single(1).unwrap().available, Amount::ether(15));

        let before = m.ledger.balance_of(m.lender);
        m.send(m.lender, Amount::ZERO, LoanCall::CancelLoan { loan_id: 1 }).unwrap();
        assert_eq!(m.ledger.balance_of(m.lender), before + Amount::ether(15));
        let err = m.send(m.borrower, Amount::ZERO, borrow).unwrap_err();
        assert!(matches!(asset_err(err), AssetError::LoanInactive(1)));
    }

    #[test]
    fn repayment_forwards_to_lender_and_refunds_excess() {
        let mut m = Market::new();
        m.approved_borrow();
        let lender_before = m.ledger.balance_of(m.lender);
        let borrower_before = m.ledger.balance_of(m.borrower);

        m.send(m.borrower, Amount::ether(2), LoanCall::RepayLoan { borrow_id: 1 })
            .unwrap();
        let record = m.contract().fetch_borrow_single(1).unwrap();
        assert_eq!(record.amount_already_remitted, Amount::ether(2));
        assert!(!record.is_repaid);

        m.send(m.borrower, Amount::ether(10), LoanCall::RepayLoan { borrow_id: 1 })
            .unwrap();
        let record = m.contract().fetch_borrow_single(1).unwrap();
        assert!(record.is_repaid);
        assert!(record.current_borrow_amount.is_zero());
        let debt = Amount::new(5_250_000_000_000_000_000);
        assert_eq!(m.ledger.balance_of(m.lender), lender_before + debt);
        assert_eq!(m.ledger.balance_of(m.borrower), borrower_before - debt);

        let err = m
            .send(m.borrower, Amount::ether(1), LoanCall::RepayLoan { borrow_id: 1 })
            .unwrap_err();
        assert!(matches!(asset_err(err), AssetError::AlreadySettled(1)));
    }

    #[test]
    fn liquidation_waits_for_due_date() {
        let mut m = Market::new();
        m.approved_borrow();
        let liquidator = wallet(4);
        let liquidate = LoanCall::LiquidateCollateral {
            borrow_id: 1,
            sale: "PRIVATE_SALE".into(),
        };

        let err = m.send(liquidator, Amount::ether(5), liquidate.clone()).unwrap_err();
        assert!(matches!(asset_err(err), AssetError::LoanNotDue { .. }));

        m.ledger.move_time(13 * SECONDS_PER_MONTH);
        let err = m.send(liquidator, Amount::ether(4), liquidate.clone()).unwrap_err();
        assert!(matches!(asset_err(err), AssetError::LiquidationTooLow { .. }));

        let lender_before = m.ledger.balance_of(m.lender);
        let receipt = m
            .ledger
            .transact(liquidator, m.loan, Amount::ether(5), &liquidate.encode())
            .unwrap();
        let event = receipt.event::<CollateralLiquidated>().unwrap();
        assert_eq!(event.sale, "PRIVATE_SALE");
        assert_eq!(m.ledger.balance_of(m.lender), lender_before + Amount::ether(5));
        let nft = m.ledger.contract::<Fisch>(m.fisch).unwrap();
        assert_eq!(nft.owner_of(0).unwrap(), liquidator);
        assert!(m.contract().fetch_borrow_single(1).unwrap().liquidated);
    }

    #[test]
    fn unapproved_borrow_cannot_be_repaid() {
        let mut m = Market::new();
        let create = LoanCall::CreateOrListLoan {
            interest_percent: 5,
            duration_months: 1,
        };
        m.send(m.lender, Amount::ether(10), create).unwrap();
        let borrow = LoanCall::Borrow {
            loan_id: 1,
            amount: Amount::ether(1),
            nft_id: 0,
            borrower: m.borrower,
        };
        m.send(m.borrower, Amount::ZERO, borrow).unwrap();

        let err = m
            .send(m.borrower, Amount::ether(1), LoanCall::RepayLoan { borrow_id: 1 })
            .unwrap_err();
        assert!(matches!(asset_err(err), AssetError::BorrowNotApproved(1)));
        let err = m
            .send(m.borrower, Amount::ZERO, LoanCall::ApproveLoan { borrow_id: 1 })
            .unwrap_err();
        assert!(matches!(asset_err(err), AssetError::NotLender));
    }
}
