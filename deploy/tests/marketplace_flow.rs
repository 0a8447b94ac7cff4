//! Auction flow on the deployed marketplace.

mod common;

use common::fixture;
use village_assets::{AssetError, Fisch, FischCall, Marketplace, MarketplaceCall};
use village_types::Amount;

#[test]
fn auction_sells_to_highest_bidder() {
    let mut f = fixture();
    let (seller, alice, bob) = (f.deployer(), f.liquidator(), f.borrower());
    let (fisch, market) = (f.fisch, f.marketplace);
    let token_id = f.mint(seller);
    let operator = FischCall::SetApprovalForAll {
        operator: market,
        approved: true,
    };
    f.send(seller, fisch, Amount::ZERO, &operator.encode()).unwrap();

    let end_time = f.env.ledger.block().timestamp.plus_secs(86_400);
    let start = MarketplaceCall::StartAuction {
        token_id,
        end_time,
        reserve_price: Amount::ether(2),
    };
    f.send(seller, market, Amount::ZERO, &start.encode()).unwrap();

    let bid = MarketplaceCall::PlaceBid { token_id }.encode();
    f.send(alice, market, Amount::ether(2), &bid).unwrap();
    let err = f.send(bob, market, Amount::ether(2), &bid).unwrap_err();
    assert!(matches!(err.reason::<AssetError>(), Some(AssetError::BidTooLow { .. })));
    f.send(bob, market, Amount::ether(4), &bid).unwrap();

    f.env.ledger.move_time(86_400);
    f.send(seller, market, Amount::ZERO, &MarketplaceCall::ResultAuction { token_id }.encode())
        .unwrap();
    let seller_before = f.env.ledger.balance_of(seller);
    f.send(bob, market, Amount::ZERO, &MarketplaceCall::ConfirmAuction { token_id }.encode())
        .unwrap();

    let ledger = &f.env.ledger;
    assert_eq!(ledger.contract::<Fisch>(fisch).unwrap().owner_of(token_id).unwrap(), bob);
    assert_eq!(ledger.balance_of(seller), seller_before + Amount::ether(4));
    let auction = ledger.contract::<Marketplace>(market).unwrap().auction(token_id).unwrap().clone();
    assert!(auction.confirmed);
    assert_eq!(auction.winner, Some(bob));
}

#[test]
fn marketplace_stays_with_deployer() {
    let mut f = fixture();
    let (deployer, market) = (f.deployer(), f.marketplace);
    assert_eq!(f.env.ledger.contract::<Marketplace>(market).unwrap().owner(), deployer);
    let update = MarketplaceCall::SetMinimumBid {
        minimum_bid: Amount::ether(2),
    };
    f.send(deployer, market, Amount::ZERO, &update.encode()).unwrap();
    assert_eq!(f.env.ledger.contract::<Marketplace>(market).unwrap().minimum_bid(), Amount::ether(2));
}
