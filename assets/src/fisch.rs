//! Fisch: NFTs representing digital businesses.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;
use village_ledger::{codec, CallContext, CallError, Contract, EventData, Ownable};
use village_types::{Address, Amount};

use crate::error::AssetError;

/// Business metadata attached to a Fisch token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalAsset {
    pub title: String,
    pub description: String,
    pub price: Amount,
    pub asset_uri: String,
    pub revenue: Amount,
    pub expenses: Amount,
    pub traffic: Amount,
    pub product_link: String,
    pub owner_email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftItem {
    pub token_id: u64,
    pub owner: Address,
    pub asset: DigitalAsset,
    pub is_collateral: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftTransferred {
    pub from: Address,
    pub to: Address,
    pub token_id: u64,
}

impl EventData for NftTransferred {
    const NAME: &'static str = "NftTransferred";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftApproval {
    pub owner: Address,
    pub approved: Address,
    pub token_id: u64,
}

impl EventData for NftApproval {
    const NAME: &'static str = "NftApproval";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalForAll {
    pub owner: Address,
    pub operator: Address,
    pub approved: bool,
}

impl EventData for ApprovalForAll {
    const NAME: &'static str = "ApprovalForAll";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralApproved {
    pub token_id: u64,
}

impl EventData for CollateralApproved {
    const NAME: &'static str = "CollateralApproved";
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum FischCall {
    MintNft(DigitalAsset),
    Approve { to: Address, token_id: u64 },
    SetApprovalForAll { operator: Address, approved: bool },
    TransferFrom { from: Address, to: Address, token_id: u64 },
    MakeNftCollateral { token_id: u64 },
    TransferOwnership { new_owner: Address },
}

impl FischCall {
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Fisch {
    ownable: Ownable,
    next_token_id: u64,
    owners: BTreeMap<u64, Address>,
    balances: BTreeMap<Address, u64>,
    token_approvals: BTreeMap<u64, Address>,
    operators: BTreeSet<(Address, Address)>,
    assets: BTreeMap<u64, DigitalAsset>,
    collateral: BTreeSet<u64>,
}

impl Fisch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn total_minted(&self) -> u64 {
        self.next_token_id
    }

    pub fn owner_of(&self, token_id: u64) -> Result<Address, AssetError> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(AssetError::NonexistentToken(token_id))
    }

    pub fn balance_of(&self, owner: Address) -> u64 {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    pub fn get_approved(&self, token_id: u64) -> Result<Address, AssetError> {
        self.owner_of(token_id)?;
        Ok(self
            .token_approvals
            .get(&token_id)
            .copied()
            .unwrap_or(Address::ZERO))
    }

    pub fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.operators.contains(&(owner, operator))
    }

    pub fn is_collateral(&self, token_id: u64) -> bool {
        self.collateral.contains(&token_id)
    }

    pub fn get_nft_item(&self, token_id: u64) -> Result<NftItem, AssetError> {
        let owner = self.owner_of(token_id)?;
        Ok(NftItem {
            token_id,
            owner,
            asset: self.assets.get(&token_id).cloned().unwrap_or_default(),
            is_collateral: self.is_collateral(token_id),
        })
    }

    fn is_approved_or_owner(&self, spender: Address, token_id: u64) -> Result<bool, AssetError> {
        let owner = self.owner_of(token_id)?;
        Ok(spender == owner
            || self.get_approved(token_id)? == spender
            || self.is_approved_for_all(owner, spender))
    }

    fn mint(&mut self, ctx: &mut CallContext<'_>, to: Address, asset: DigitalAsset) -> u64 {
        let token_id = self.next_token_id;
        self.next_token_id += 1;
        self.owners.insert(token_id, to);
        *self.balances.entry(to).or_insert(0) += 1;
        self.assets.insert(token_id, asset);
        debug!(token_id, owner = %to, "fisch minted");
        ctx.emit(&NftTransferred {
            from: Address::ZERO,
            to,
            token_id,
        });
        token_id
    }

    fn approve(&mut self, ctx: &mut CallContext<'_>, caller: Address, to: Address, token_id: u64) -> Result<(), AssetError> {
        let owner = self.owner_of(token_id)?;
        if to == owner {
            return Err(AssetError::ApproveToOwner);
        }
        if caller != owner && !self.is_approved_for_all(owner, caller) {
            return Err(AssetError::NotApproved {
                token_id,
                caller,
            });
        }
        self.token_approvals.insert(token_id, to);
        ctx.emit(&NftApproval {
            owner,
            approved: to,
            token_id,
        });
        Ok(())
    }

    fn transfer_from(
        &mut self,
        ctx: &mut CallContext<'_>,
        caller: Address,
        from: Address,
        to: Address,
        token_id: u64,
    ) -> Result<(), AssetError> {
        if !self.is_approved_or_owner(caller, token_id)? {
            return Err(AssetError::NotApproved {
                token_id,
                caller,
            });
        }
        if self.owner_of(token_id)? != from {
            return Err(AssetError::NotTokenOwner {
                token_id,
                caller: from,
            });
        }
        if to.is_zero() {
            return Err(AssetError::TransferToZero);
        }
        self.token_approvals.remove(&token_id);
        if let Some(balance) = self.balances.get_mut(&from) {
            *balance = balance.saturating_sub(1);
        }
        *self.balances.entry(to).or_insert(0) += 1;
        self.owners.insert(token_id, to);
        ctx.emit(&NftTransferred { from, to, token_id });
        Ok(())
    }
}

impl Contract for Fisch {
    fn name(&self) -> &'static str {
        "Fisch"
    }

    fn deployed(&mut self, ctx: &mut CallContext<'_>) -> Result<(), CallError> {
        self.ownable.initialize(ctx);
        Ok(())
    }

    fn handle(&mut self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, CallError> {
        ctx.require_no_value()?;
        let caller = ctx.sender();
        match codec::decode::<FischCall>(calldata)? {
            FischCall::MintNft(asset) => {
                let token_id = self.mint(ctx, caller, asset);
                return Ok(codec::encode(&token_id));
            }
            FischCall::Approve { to, token_id } => self.approve(ctx, caller, to, token_id)?,
            FischCall::SetApprovalForAll { operator, approved } => {
                if approved {
                    self.operators.insert((caller, operator));
                } else {
                    self.operators.remove(&(caller, operator));
                }
                ctx.emit(&ApprovalForAll {
                    owner: caller,
                    operator,
                    approved,
                });
            }
            FischCall::TransferFrom { from, to, token_id } => {
                self.transfer_from(ctx, caller, from, to, token_id)?
            }
            FischCall::MakeNftCollateral { token_id } => {
                self.ownable.only_owner(caller)?;
                self.owner_of(token_id)?;
                self.collateral.insert(token_id);
                debug!(token_id, "fisch approved as collateral");
                ctx.emit(&CollateralApproved { token_id });
            }
            FischCall::TransferOwnership { new_owner } => {
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
