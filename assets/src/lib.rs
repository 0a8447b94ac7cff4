//! Business contracts governed by the VillageSquare DAO.
//!
//! - [`Fisch`]: NFTs representing digital businesses; the owner (the lock
//!   controller after deployment) decides which may serve as collateral.
//! - [`Loan`]: lenders list funded loans, borrowers pledge a Fisch NFT, and
//!   unpaid debt past its due date can be liquidated.
//! - [`Marketplace`]: timed English auctions of Fisch NFTs.

pub mod error;
pub mod fisch;
pub mod loan;
pub mod marketplace;

pub use error::AssetError;
pub use fisch::{DigitalAsset, Fisch, FischCall, NftItem};
pub use loan::{BorrowRecord, Loan, LoanCall, LoanListing, SECONDS_PER_MONTH};
pub use marketplace::{Auction, HighestBid, Marketplace, MarketplaceCall};
