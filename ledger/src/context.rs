//! Per-call execution context and the call dispatcher.

use std::collections::{BTreeMap, BTreeSet};

use village_types::{Address, Amount};

use crate::clock::BlockEnv;
use crate::codec;
use crate::contract::{downcast, Contract};
use crate::error::CallError;
use crate::event::{EventData, Log};

/// Maximum nesting of contract-to-contract calls.
pub const MAX_CALL_DEPTH: usize = 64;

/// Every piece of state a transaction can touch.
#[derive(Clone, Default)]
pub(crate) struct WorldState {
    pub(crate) contracts: BTreeMap<Address, Box<dyn Contract>>,
    /// Contracts currently executing (taken out of `contracts`).
    pub(crate) on_stack: BTreeSet<Address>,
    pub(crate) balances: BTreeMap<Address, Amount>,
}

impl WorldState {
    pub(crate) fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(Amount::ZERO)
    }

    pub(crate) fn move_value(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), CallError> {
        if amount.is_zero() || from == to {
            return Ok(());
        }
        let available = self.balance(&from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(CallError::InsufficientBalance {
                account: from,
                needed: amount,
                available,
            })?;
        let credited = self
            .balance(&to)
            .checked_add(amount)
            .ok_or(CallError::BalanceOverflow(to))?;
        self.balances.insert(from, remaining);
        self.balances.insert(to, credited);
        Ok(())
    }
}

/// One call frame: who calls whom with how much value.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Frame {
    pub(crate) sender: Address,
    pub(crate) target: Address,
    pub(crate) value: Amount,
    pub(crate) depth: usize,
}

/// What a contract sees while handling a call.
pub struct CallContext<'a> {
    state: &'a mut WorldState,
    logs: &'a mut Vec<Log>,
    block: BlockEnv,
    frame: Frame,
}

impl<'a> CallContext<'a> {
    /// The immediate caller (`msg.sender`).
    pub fn sender(&self) -> Address {
        self.frame.sender
    }

    /// The executing contract's own address.
    pub fn this(&self) -> Address {
        self.frame.target
    }

    /// Value attached to this call, already credited to `this`.
    pub fn value(&self) -> Amount {
        self.frame.value
    }

    pub fn block(&self) -> BlockEnv {
        self.block
    }

    /// Reject calls that carry value.
    pub fn require_no_value(&self) -> Result<(), CallError> {
        if self.frame.value.is_zero() {
            Ok(())
        } else {
            Err(CallError::NonPayable)
        }
    }

    /// Call another contract with `this` as the sender.
    pub fn call(
        &mut self,
        target: Address,
        value: Amount,
        calldata: &[u8],
    ) -> Result<Vec<u8>, CallError> {
        let frame = Frame {
            sender: self.frame.target,
            target,
            value,
            depth: self.frame.depth + 1,
        };
        dispatch(self.state, self.logs, self.block, frame, calldata)
    }

    /// Read another contract's state.
    pub fn view<T: Contract>(&self, address: Address) -> Result<&T, CallError> {
        if self.state.on_stack.contains(&address) {
            return Err(CallError::Reentrancy(address));
        }
        let contract = self
            .state
            .contracts
            .get(&address)
            .ok_or(CallError::NoContract(address))?;
        downcast::<T>(contract.as_ref(), address)
    }

    /// Append an event to this transaction's logs.
    pub fn emit<E: EventData>(&mut self, event: &E) {
        self.logs.push(Log {
            emitter: self.frame.target,
            block: self.block.number,
            name: E::NAME.to_string(),
            data: codec::encode(event),
        });
    }

    /// Send native value from `this` to `to` (no code runs at `to`).
    pub fn transfer(&mut self, to: Address, amount: Amount) -> Result<(), CallError> {
        self.state.move_value(self.frame.target, to, amount)
    }

    pub fn balance(&self, account: Address) -> Amount {
        self.state.balance(&account)
    }

    pub fn is_contract(&self, account: Address) -> bool {
        self.state.contracts.contains_key(&account) || self.state.on_stack.contains(&account)
    }
}

/// Run a call frame; on failure every change beneath it is rolled back.
pub(crate) fn dispatch(
    state: &mut WorldState,
    logs: &mut Vec<Log>,
    block: BlockEnv,
    frame: Frame,
    calldata: &[u8],
) -> Result<Vec<u8>, CallError> {
    if frame.depth > MAX_CALL_DEPTH {
        return Err(CallError::DepthExceeded(MAX_CALL_DEPTH));
    }
    if state.on_stack.contains(&frame.target) {
        return Err(CallError::Reentrancy(frame.target));
    }

    let checkpoint = state.clone();
    let log_mark = logs.len();
    let result = run_frame(state, logs, block, frame, calldata);
    if result.is_err() {
        *state = checkpoint;
        logs.truncate(log_mark);
    }
    result
}

fn run_frame(
    state: &mut WorldState,
    logs: &mut Vec<Log>,
    block: BlockEnv,
    frame: Frame,
    calldata: &[u8],
) -> Result<Vec<u8>, CallError> {
    state.move_value(frame.sender, frame.target, frame.value)?;

    let Some(mut contract) = state.contracts.remove(&frame.target) else {
        // Plain value transfer to an account without code.
        if calldata.is_empty() {
            return Ok(Vec::new());
        }
        return Err(CallError::NoContract(frame.target));
    };

    state.on_stack.insert(frame.target);
    let result = {
        let mut ctx = CallContext {
            state: &mut *state,
            logs: &mut *logs,
            block,
            frame,
        };
        contract.handle(&mut ctx, calldata)
    };
    state.on_stack.remove(&frame.target);
    state.contracts.insert(frame.target, contract);
    result
}

/// Install a new contract at `address`, running its constructor hook.
pub(crate) fn install(
    state: &mut WorldState,
    logs: &mut Vec<Log>,
    block: BlockEnv,
    deployer: Address,
    address: Address,
    mut contract: Box<dyn Contract>,
) -> Result<(), CallError> {
    let checkpoint = state.clone();
    let log_mark = logs.len();

    let frame = Frame {
        sender: deployer,
        target: address,
        value: Amount::ZERO,
        depth: 0,
    };
    state.on_stack.insert(address);
    let result = {
        let mut ctx = CallContext {
            state: &mut *state,
            logs: &mut *logs,
            block,
            frame,
        };
        contract.deployed(&mut ctx)
    };
    state.on_stack.remove(&address);

    match result {
        Ok(()) => {
            state.contracts.insert(address, contract);
            Ok(())
        }
        Err(e) => {
            *state = checkpoint;
            logs.truncate(log_mark);
            Err(e)
        }
    }
}
