//! The CowriesToken contract.

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use village_ledger::{codec, CallContext, CallError, Contract, EventData};
use village_types::{Address, Amount, BlockNumber};

use crate::checkpoints::{Checkpoint, Checkpoints};
use crate::error::TokenError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub value: Amount,
}

impl EventData for Transfer {
    const NAME: &'static str = "Transfer";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub owner: Address,
    pub spender: Address,
    pub value: Amount,
}

impl EventData for Approval {
    const NAME: &'static str = "Approval";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateChanged {
    pub delegator: Address,
    pub from_delegate: Address,
    pub to_delegate: Address,
}

impl EventData for DelegateChanged {
    const NAME: &'static str = "DelegateChanged";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateVotesChanged {
    pub delegate: Address,
    pub previous_balance: Amount,
    pub new_balance: Amount,
}

impl EventData for DelegateVotesChanged {
    const NAME: &'static str = "DelegateVotesChanged";
}

/// Calldata accepted by [`CowriesToken`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TokenCall {
    Transfer { to: Address, amount: Amount },
    Approve { spender: Address, amount: Amount },
    TransferFrom { from: Address, to: Address, amount: Amount },
    Delegate { delegatee: Address },
}

impl TokenCall {
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }
}

/// ERC20Votes-style token. The initial supply is minted to the deployer.
#[derive(Clone, Debug)]
pub struct CowriesToken {
    name: String,
    symbol: String,
    initial_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<(Address, Address), Amount>,
    delegates: BTreeMap<Address, Address>,
    votes: BTreeMap<Address, Checkpoints>,
    total_supply: Checkpoints,
}

impl CowriesToken {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, initial_supply: Amount) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            initial_supply,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            delegates: BTreeMap::new(),
            votes: BTreeMap::new(),
            total_supply: Checkpoints::new(),
        }
    }

    pub fn token_name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply.latest()
    }

    pub fn balance_of(&self, account: Address) -> Amount {
        self.balances.get(&account).copied().unwrap_or(Amount::ZERO)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Current delegate of `account`, zero if it never delegated.
    pub fn delegates(&self, account: Address) -> Address {
        self.delegates.get(&account).copied().unwrap_or(Address::ZERO)
    }

    pub fn num_checkpoints(&self, account: Address) -> usize {
        self.votes.get(&account).map(Checkpoints::len).unwrap_or(0)
    }

    pub fn checkpoints(&self, account: Address, pos: usize) -> Option<Checkpoint> {
        self.votes.get(&account).and_then(|c| c.get(pos))
    }

    /// Current voting power of `account`.
    pub fn get_votes(&self, account: Address) -> Amount {
        self.votes
            .get(&account)
            .map(Checkpoints::latest)
            .unwrap_or(Amount::ZERO)
    }

    /// Voting power of `account` at the end of `block`. `current` is the
    /// block being executed; later blocks are not yet known.
    pub fn get_past_votes(
        &self,
        account: Address,
        block: BlockNumber,
        current: BlockNumber,
    ) -> Result<Amount, TokenError> {
        check_lookup(block, current)?;
        Ok(self
            .votes
            .get(&account)
            .map(|c| c.upper_lookup(block))
            .unwrap_or(Amount::ZERO))
    }

    /// Total supply at the end of `block`.
    pub fn get_past_total_supply(
        &self,
        block: BlockNumber,
        current: BlockNumber,
    ) -> Result<Amount, TokenError> {
        check_lookup(block, current)?;
        Ok(self.total_supply.upper_lookup(block))
    }

    fn mint(&mut self, ctx: &mut CallContext<'_>, to: Address, amount: Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::TransferToZero);
        }
        let supply = self
            .total_supply()
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        let block = ctx.block().number;
        self.total_supply.push(block, supply);
        let balance = self.balance_of(to) + amount;
        self.balances.insert(to, balance);
        ctx.emit(&Transfer {
            from: Address::ZERO,
            to,
            value: amount,
        });
        let dst = self.delegates(to);
        self.move_voting_power(ctx, Address::ZERO, dst, amount);
        Ok(())
    }

    fn transfer(
        &mut self,
        ctx: &mut CallContext<'_>,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::TransferToZero);
        }
        let have = self.balance_of(from);
        let remaining = have
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                account: from,
                have,
                need: amount,
            })?;
        self.balances.insert(from, remaining);
        let credited = self.balance_of(to) + amount;
        self.balances.insert(to, credited);
        ctx.emit(&Transfer {
            from,
            to,
            value: amount,
        });

        let (src, dst) = (self.delegates(from), self.delegates(to));
        self.move_voting_power(ctx, src, dst, amount);
        Ok(())
    }

    fn spend_allowance(&mut self, owner: Address, spender: Address, amount: Amount) -> Result<(), TokenError> {
        let have = self.allowance(owner, spender);
        let remaining = have
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientAllowance { have, need: amount })?;
        self.allowances.insert((owner, spender), remaining);
        Ok(())
    }

    fn delegate(&mut self, ctx: &mut CallContext<'_>, delegator: Address, delegatee: Address) {
        let previous = self.delegates(delegator);
        self.delegates.insert(delegator, delegatee);
        ctx.emit(&DelegateChanged {
            delegator,
            from_delegate: previous,
            to_delegate: delegatee,
        });
        debug!(%delegator, %delegatee, "votes delegated");
        let balance = self.balance_of(delegator);
        self.move_voting_power(ctx, previous, delegatee, balance);
    }

    fn move_voting_power(&mut self, ctx: &mut CallContext<'_>, src: Address, dst: Address, amount: Amount) {
        if src == dst || amount.is_zero() {
            return;
        }
        let block = ctx.block().number;
        if !src.is_zero() {
            let history = self.votes.entry(src).or_default();
            let previous = history.latest();
            let new = previous.saturating_sub(amount);
            history.push(block, new);
            ctx.emit(&DelegateVotesChanged {
                delegate: src,
                previous_balance: previous,
                new_balance: new,
            });
        }
        if !dst.is_zero() {
            let history = self.votes.entry(dst).or_default();
            let previous = history.latest();
            let new = previous + amount;
            history.push(block, new);
            ctx.emit(&DelegateVotesChanged {
                delegate: dst,
                previous_balance: previous,
                new_balance: new,
            });
        }
    }
}

fn check_lookup(block: BlockNumber, current: BlockNumber) -> Result<(), TokenError> {
    if block > current {
        return Err(TokenError::FutureLookup {
            requested: block,
            current,
        });
    }
    Ok(())
}

impl Contract for CowriesToken {
    fn name(&self) -> &'static str {
        "CowriesToken"
    }

    fn deployed(&mut self, ctx: &mut CallContext<'_>) -> Result<(), CallError> {
        let deployer = ctx.sender();
        let supply = self.initial_supply;
        self.mint(ctx, deployer, supply)?;
        Ok(())
    }

    fn handle(&mut self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, CallError> {
        ctx.require_no_value()?;
        let caller = ctx.sender();
        match codec::decode::<TokenCall>(calldata)? {
            TokenCall::Transfer { to, amount } => self.transfer(ctx, caller, to, amount)?,
            TokenCall::Approve { spender, amount } => {
                self.allowances.insert((caller, spender), amount);
                ctx.emit(&Approval {
                    owner: caller,
                    spender,
                    value: amount,
                });
            }
            TokenCall::TransferFrom { from, to, amount } => {
                self.spend_allowance(from, caller, amount)?;
                self.transfer(ctx, from, to, amount)?;
            }
            TokenCall::Delegate { delegatee } => self.delegate(ctx, caller, delegatee),
        }
        Ok(codec::encode(&true))
    }

    fn clone_box(&self) -> Box<dyn Contract> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
