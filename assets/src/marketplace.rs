//! Timed English auctions of Fisch NFTs.
//!
//! Bids are escrowed by the marketplace and refunded when outbid. After the
//! end time the seller results the auction; a highest bid at or above the
//! reserve names a winner, who confirms to receive the NFT while the seller
//! is paid. The marketplace moves the NFT as an approved operator. If the
//! seller moves the NFT or withdraws that approval before confirmation, the
//! winner reclaims the bid and the token becomes free to list again.

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use village_ledger::{codec, CallContext, CallError, Contract, EventData, Ownable};
use village_types::{Address, Amount, Timestamp};

use crate::error::AssetError;
use crate::fisch::{Fisch, FischCall};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub seller: Address,
    pub token_id: u64,
    pub end_time: Timestamp,
    pub reserve_price: Amount,
    pub resulted: bool,
    pub confirmed: bool,
    pub winner: Option<Address>,
}

impl Auction {
    /// Still blocks a new auction for the same token.
    fn is_open(&self) -> bool {
        !self.resulted || (self.winner.is_some() && !self.confirmed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighestBid {
    pub bidder: Address,
    pub bid: Amount,
    pub last_bid_time: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionCreated {
    pub token_id: u64,
    pub seller: Address,
    pub end_time: Timestamp,
    pub reserve_price: Amount,
}

impl EventData for AuctionCreated {
    const NAME: &'static str = "AuctionCreated";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionCancelled {
    pub token_id: u64,
}

impl EventData for AuctionCancelled {
    const NAME: &'static str = "AuctionCancelled";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidPlaced {
    pub token_id: u64,
    pub bidder: Address,
    pub bid: Amount,
}

impl EventData for BidPlaced {
    const NAME: &'static str = "BidPlaced";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRefunded {
    pub token_id: u64,
    pub bidder: Address,
    pub bid: Amount,
}

impl EventData for BidRefunded {
    const NAME: &'static str = "BidRefunded";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionResulted {
    pub token_id: u64,
    pub winner: Option<Address>,
    pub winning_bid: Amount,
}

impl EventData for AuctionResulted {
    const NAME: &'static str = "AuctionResulted";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionConfirmed {
    pub token_id: u64,
    pub winner: Address,
    pub price: Amount,
}

impl EventData for AuctionConfirmed {
    const NAME: &'static str = "AuctionConfirmed";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionVoided {
    pub token_id: u64,
    pub winner: Address,
    pub refund: Amount,
}

impl EventData for AuctionVoided {
    const NAME: &'static str = "AuctionVoided";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimumBidUpdated {
    pub minimum_bid: Amount,
}

impl EventData for MinimumBidUpdated {
    const NAME: &'static str = "MinimumBidUpdated";
}

/// Calldata accepted by [`Marketplace`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MarketplaceCall {
    StartAuction {
        token_id: u64,
        end_time: Timestamp,
        reserve_price: Amount,
    },
    CancelAuction {
        token_id: u64,
    },
    PlaceBid {
        token_id: u64,
    },
    ResultAuction {
        token_id: u64,
    },
    ConfirmAuction {
        token_id: u64,
    },
    /// Winner takes the bid back when the seller can no longer deliver.
    ReclaimBid {
        token_id: u64,
    },
    SetMinimumBid {
        minimum_bid: Amount,
    },
    TransferOwnership {
        new_owner: Address,
    },
}

impl MarketplaceCall {
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }
}

#[derive(Clone, Debug)]
pub struct Marketplace {
    ownable: Ownable,
    fisch: Address,
    /// Minimum increment over the current highest bid.
    minimum_bid: Amount,
    auctions: BTreeMap<u64, Auction>,
    highest_bids: BTreeMap<u64, HighestBid>,
}

impl Marketplace {
    pub fn new(fisch: Address) -> Self {
        Self {
            ownable: Ownable::default(),
            fisch,
            minimum_bid: Amount::ether(1),
            auctions: BTreeMap::new(),
            highest_bids: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn fisch(&self) -> Address {
        self.fisch
    }

    pub fn minimum_bid(&self) -> Amount {
        self.minimum_bid
    }

    pub fn auction(&self, token_id: u64) -> Option<&Auction> {
        self.auctions.get(&token_id)
    }

    pub fn highest_bid(&self, token_id: u64) -> Option<&HighestBid> {
        self.highest_bids.get(&token_id)
    }

    fn auction_of(&self, token_id: u64) -> Result<&Auction, AssetError> {
        self.auctions.get(&token_id).ok_or(AssetError::NoAuction(token_id))
    }

    fn refund_highest(&mut self, ctx: &mut CallContext<'_>, token_id: u64) -> Result<(), CallError> {
        if let Some(HighestBid { bidder, bid, .. }) = self.highest_bids.remove(&token_id) {
            ctx.transfer(bidder, bid)?;
            debug!(token_id, bidder = %bidder, bid = %bid, "bid refunded");
            ctx.emit(&BidRefunded {
                token_id,
                bidder,
                bid,
            });
        }
        Ok(())
    }

    fn start(
        &mut self,
        ctx: &mut CallContext<'_>,
        token_id: u64,
        end_time: Timestamp,
        reserve_price: Amount,
    ) -> Result<(), CallError> {
        let seller = ctx.sender();
        let owner = ctx.view::<Fisch>(self.fisch)?.owner_of(token_id)?;
        if owner != seller {
            return Err(AssetError::NotTokenOwner {
                token_id,
                caller: seller,
            }
            .into());
        }
        if self.auctions.get(&token_id).is_some_and(Auction::is_open) {
            return Err(AssetError::AuctionExists(token_id).into());
        }
        if end_time <= ctx.block().timestamp {
            return Err(AssetError::InvalidEndTime { end_time }.into());
        }
        self.auctions.insert(
            token_id,
            Auction {
                seller,
                token_id,
                end_time,
                reserve_price,
                resulted: false,
                confirmed: false,
                winner: None,
            },
        );
        info!(token_id, seller = %seller, end_time = %end_time, "auction started");
        ctx.emit(&AuctionCreated {
            token_id,
            seller,
            end_time,
            reserve_price,
        });
        Ok(())
    }

    fn bid(&mut self, ctx: &mut CallContext<'_>, token_id: u64) -> Result<(), CallError> {
        let bidder = ctx.sender();
        let bid = ctx.value();
        let now = ctx.block().timestamp;
        let auction = self.auction_of(token_id)?;
        if auction.resulted || now >= auction.end_time {
            return Err(AssetError::AuctionEnded(token_id).into());
        }
        if auction.seller == bidder {
            return Err(AssetError::SellerCannotBid.into());
        }
        let current = self
            .highest_bids
            .get(&token_id)
            .map_or(Amount::ZERO, |h| h.bid);
        let minimum = current
            .checked_add(self.minimum_bid)
            .ok_or(AssetError::Overflow)?;
        if bid < minimum {
            return Err(AssetError::BidTooLow { bid, minimum }.into());
        }

        self.refund_highest(ctx, token_id)?;
        self.highest_bids.insert(
            token_id,
            HighestBid {
                bidder,
                bid,
                last_bid_time: now,
            },
        );
        debug!(token_id, bidder = %bidder, bid = %bid, "bid placed");
        ctx.emit(&BidPlaced {
            token_id,
            bidder,
            bid,
        });
        Ok(())
    }

    fn result(&mut self, ctx: &mut CallContext<'_>, token_id: u64) -> Result<(), CallError> {
        let now = ctx.block().timestamp;
        let auction = self.auction_of(token_id)?;
        if auction.seller != ctx.sender() {
            return Err(AssetError::NotSeller.into());
        }
        if auction.resulted {
            return Err(AssetError::AuctionAlreadyResulted(token_id).into());
        }
        if now < auction.end_time {
            return Err(AssetError::AuctionNotEnded(token_id).into());
        }
        let reserve = auction.reserve_price;

        let winning = self
            .highest_bids
            .get(&token_id)
            .filter(|h| h.bid >= reserve)
            .map(|h| (h.bidder, h.bid));
        if winning.is_none() {
            self.refund_highest(ctx, token_id)?;
        }
        if let Some(auction) = self.auctions.get_mut(&token_id) {
            auction.resulted = true;
            auction.winner = winning.map(|(bidder, _)| bidder);
        }
        let winning_bid = winning.map_or(Amount::ZERO, |(_, bid)| bid);
        info!(token_id, sold = winning.is_some(), bid = %winning_bid, "auction resulted");
        ctx.emit(&AuctionResulted {
            token_id,
            winner: winning.map(|(bidder, _)| bidder),
            winning_bid,
        });
        Ok(())
    }

    fn confirm(&mut self, ctx: &mut CallContext<'_>, token_id: u64) -> Result<(), CallError> {
        let auction = self.auction_of(token_id)?.clone();
        if !auction.resulted {
            return Err(AssetError::AuctionNotResulted(token_id).into());
        }
        if auction.confirmed {
            return Err(AssetError::AuctionAlreadyConfirmed(token_id).into());
        }
        let winner = ctx.sender();
        if auction.winner != Some(winner) {
            return Err(AssetError::NotWinner.into());
        }
        let price = self
            .highest_bids
            .remove(&token_id)
            .map_or(Amount::ZERO, |h| h.bid);

        let transfer = FischCall::TransferFrom {
            from: auction.seller,
            to: winner,
            token_id,
        };
        ctx.call(self.fisch, Amount::ZERO, &transfer.encode())?;
        ctx.transfer(auction.seller, price)?;
        if let Some(auction) = self.auctions.get_mut(&token_id) {
            auction.confirmed = true;
        }
        info!(token_id, winner = %winner, price = %price, "auction confirmed");
        ctx.emit(&AuctionConfirmed {
            token_id,
            winner,
            price,
        });
        Ok(())
    }

    fn reclaim(&mut self, ctx: &mut CallContext<'_>, token_id: u64) -> Result<(), CallError> {
        let auction = self.auction_of(token_id)?.clone();
        if !auction.resulted {
            return Err(AssetError::AuctionNotResulted(token_id).into());
        }
        if auction.confirmed {
            return Err(AssetError::AuctionAlreadyConfirmed(token_id).into());
        }
        let winner = ctx.sender();
        if auction.winner != Some(winner) {
            return Err(AssetError::NotWinner.into());
        }
        let fisch = ctx.view::<Fisch>(self.fisch)?;
        let market = ctx.this();
        let deliverable = fisch.owner_of(token_id).is_ok_and(|owner| owner == auction.seller)
            && (fisch.is_approved_for_all(auction.seller, market)
                || fisch.get_approved(token_id).is_ok_and(|approved| approved == market));
        if deliverable {
            return Err(AssetError::AuctionDeliverable(token_id).into());
        }

        let refund = self
            .highest_bids
            .remove(&token_id)
            .map_or(Amount::ZERO, |h| h.bid);
        ctx.transfer(winner, refund)?;
        if let Some(auction) = self.auctions.get_mut(&token_id) {
            auction.winner = None;
        }
        info!(token_id, winner = %winner, refund = %refund, "auction voided");
        ctx.emit(&AuctionVoided {
            token_id,
            winner,
            refund,
        });
        Ok(())
    }
}

impl Contract for Marketplace {
    fn name(&self) -> &'static str {
        "Marketplace"
    }

    fn deployed(&mut self, ctx: &mut CallContext<'_>) -> Result<(), CallError> {
        self.ownable.initialize(ctx);
        Ok(())
    }

    fn handle(&mut self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, CallError> {
        let call = codec::decode::<MarketplaceCall>(calldata)?;
        if !matches!(call, MarketplaceCall::PlaceBid { .. }) {
            ctx.require_no_value()?;
        }
        match call {
            MarketplaceCall::StartAuction {
                token_id,
                end_time,
                reserve_price,
            } => self.start(ctx, token_id, end_time, reserve_price)?,
            MarketplaceCall::CancelAuction { token_id } => {
                let auction = self.auction_of(token_id)?;
                if auction.seller != ctx.sender() {
                    return Err(AssetError::NotSeller.into());
                }
                if auction.resulted {
                    return Err(AssetError::AuctionAlreadyResulted(token_id).into());
                }
                self.refund_highest(ctx, token_id)?;
                self.auctions.remove(&token_id);
                info!(token_id, "auction cancelled");
                ctx.emit(&AuctionCancelled { token_id });
            }
            MarketplaceCall::PlaceBid { token_id } => self.bid(ctx, token_id)?,
            MarketplaceCall::ResultAuction { token_id } => self.result(ctx, token_id)?,
            MarketplaceCall::ConfirmAuction { token_id } => self.confirm(ctx, token_id)?,
            MarketplaceCall::ReclaimBid { token_id } => self.reclaim(ctx, token_id)?,
            MarketplaceCall::SetMinimumBid { minimum_bid } => {
                self.ownable.only_owner(ctx.sender())?;
                self.minimum_bid = minimum_bid;
                ctx.emit(&MinimumBidUpdated { minimum_bid });
            }
            MarketplaceCall::TransferOwnership { new_owner } => {
                self.ownable.transfer_ownership(ctx, new_owner)?
            }
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
