//! Collateralised lending on the deployed contracts.

mod common;

use common::{fixture, Fixture};
use village_assets::loan::CollateralLiquidated;
use village_assets::{AssetError, Fisch, FischCall, Loan, LoanCall, SECONDS_PER_MONTH};
use village_ledger::CallError;
use village_types::{Address, Amount};

/// Approve a fresh borrower NFT as collateral through governance and let the
/// loan contract move it.
fn collateral(f: &mut Fixture) -> u64 {
    let token_id = f.mint(f.borrower());
    let fisch = f.fisch;
    f.govern(
        fisch,
        FischCall::MakeNftCollateral { token_id }.encode(),
        &format!("Approve token {token_id} as collateral"),
    );
    let operator = FischCall::SetApprovalForAll {
        operator: f.loan,
        approved: true,
    };
    let borrower = f.borrower();
    f.send(borrower, fisch, Amount::ZERO, &operator.encode()).unwrap();
    token_id
}

fn loan_call(f: &mut Fixture, from: Address, value: Amount, call: LoanCall) -> Result<(), CallError> {
    let loan = f.loan;
    f.send(from, loan, value, &call.encode()).map(|_| ())
}

#[test]
fn creates_a_loan() {
    let mut f = fixture();
    let lender = f.deployer();
    let create = LoanCall::CreateOrListLoan {
        interest_percent: 5,
        duration_months: 13,
    };
    loan_call(&mut f, lender, Amount::ether(100), create).unwrap();
    let listing = f.env.ledger.contract::<Loan>(f.loan).unwrap().fetch_loan_single(1).unwrap().clone();
    assert_eq!(listing.duration_months, 13);
    assert_eq!(listing.lender, lender);
}

#[test]
fn borrow_approve_and_repay() {
    let mut f = fixture();
    let token_id = collateral(&mut f);
    let (lender, borrower) = (f.deployer(), f.borrower());

    let create = LoanCall::CreateOrListLoan {
        interest_percent: 5,
        duration_months: 13,
    };
    loan_call(&mut f, lender, Amount::ether(100), create).unwrap();
    let borrow = LoanCall::Borrow {
        loan_id: 1,
        amount: Amount::ether(5),
        nft_id: token_id,
        borrower,
    };
    loan_call(&mut f, borrower, Amount::ZERO, borrow).unwrap();
    let record = f.env.ledger.contract::<Loan>(f.loan).unwrap().fetch_borrow_single(1).unwrap().clone();
    assert_eq!(record.current_borrow_amount, Amount::ether(5));
    assert!(!record.is_approved);

    loan_call(&mut f, lender, Amount::ZERO, LoanCall::ApproveLoan { borrow_id: 1 }).unwrap();
    let record = f.env.ledger.contract::<Loan>(f.loan).unwrap().fetch_borrow_single(1).unwrap().clone();
    assert!(record.is_approved);

    loan_call(&mut f, borrower, record.current_borrow_amount, LoanCall::RepayLoan { borrow_id: 1 }).unwrap();
    let record = f.env.ledger.contract::<Loan>(f.loan).unwrap().fetch_borrow_single(1).unwrap().clone();
    assert!(record.is_repaid);
    let nft = f.env.ledger.contract::<Fisch>(f.fisch).unwrap();
    assert_eq!(nft.owner_of(token_id).unwrap(), borrower);
}

#[test]
fn ungoverned_nft_is_not_collateral() {
    let mut f = fixture();
    let token_id = f.mint(f.borrower());
    let (lender, borrower) = (f.deployer(), f.borrower());
    let create = LoanCall::CreateOrListLoan {
        interest_percent: 5,
        duration_months: 1,
    };
    loan_call(&mut f, lender, Amount::ether(10), create).unwrap();
    let borrow = LoanCall::Borrow {
        loan_id: 1,
        amount: Amount::ether(1),
        nft_id: token_id,
        borrower,
    };
    let err = loan_call(&mut f, borrower, Amount::ZERO, borrow).unwrap_err();
    assert!(matches!(err.reason::<AssetError>(), Some(AssetError::NotCollateral(id)) if *id == token_id));
}

#[test]
fn liquidates_collateral_when_loan_duration_passes() {
    let mut f = fixture();
    let token_id = collateral(&mut f);
    let (lender, borrower, liquidator) = (f.deployer(), f.borrower(), f.liquidator());

    let create = LoanCall::CreateOrListLoan {
        interest_percent: 10,
        duration_months: 1,
    };
    loan_call(&mut f, lender, Amount::ether(50), create).unwrap();
    let borrow = LoanCall::Borrow {
        loan_id: 1,
        amount: Amount::ether(20),
        nft_id: token_id,
        borrower,
    };
    loan_call(&mut f, borrower, Amount::ZERO, borrow).unwrap();
    loan_call(&mut f, lender, Amount::ZERO, LoanCall::ApproveLoan { borrow_id: 1 }).unwrap();

    f.env.ledger.move_time(SECONDS_PER_MONTH + 1);
    let lender_before = f.env.ledger.balance_of(lender);
    let liquidate = LoanCall::LiquidateCollateral {
        borrow_id: 1,
        sale: "PRIVATE_SALE".into(),
    };
    let loan = f.loan;
    let receipt = f.send(liquidator, loan, Amount::ether(20), &liquidate.encode()).unwrap();
    assert_eq!(receipt.event::<CollateralLiquidated>().unwrap().nft_id, token_id);

    assert_eq!(f.env.ledger.balance_of(lender), lender_before + Amount::ether(20));
    let nft = f.env.ledger.contract::<Fisch>(f.fisch).unwrap();
    assert_eq!(nft.owner_of(token_id).unwrap(), liquidator);
    let record = f.env.ledger.contract::<Loan>(f.loan).unwrap().fetch_borrow_single(1).unwrap();
    assert!(record.liquidated);
    assert!(record.current_borrow_amount.is_zero());
}
