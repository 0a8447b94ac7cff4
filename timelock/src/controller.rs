//! The LockController contract.

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use village_ledger::{codec, CallContext, CallError, Contract, EventData};
use village_types::{Address, Hash32, OperationId, RoleId, Timestamp};

use crate::error::TimelockError;
use crate::operation::{hash_operation, hash_operation_batch, Call, OperationState, DONE_TIMESTAMP};
use crate::roles::{Role, RoleGranted, RoleRevoked, RoleTable};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallScheduled {
    pub id: OperationId,
    pub index: usize,
    pub call: Call,
    pub predecessor: OperationId,
    pub delay: u64,
}

impl EventData for CallScheduled {
    const NAME: &'static str = "CallScheduled";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallExecuted {
    pub id: OperationId,
    pub index: usize,
    pub call: Call,
}

impl EventData for CallExecuted {
    const NAME: &'static str = "CallExecuted";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancelled {
    pub id: OperationId,
}

impl EventData for Cancelled {
    const NAME: &'static str = "Cancelled";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinDelayChange {
    pub old_duration: u64,
    pub new_duration: u64,
}

impl EventData for MinDelayChange {
    const NAME: &'static str = "MinDelayChange";
}

/// Calldata accepted by [`LockController`]. Empty calldata is a plain
/// deposit of native value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TimelockCall {
    Schedule {
        call: Call,
        predecessor: OperationId,
        salt: Hash32,
        delay: u64,
    },
    ScheduleBatch {
        calls: Vec<Call>,
        predecessor: OperationId,
        salt: Hash32,
        delay: u64,
    },
    Execute {
        call: Call,
        predecessor: OperationId,
        salt: Hash32,
    },
    ExecuteBatch {
        calls: Vec<Call>,
        predecessor: OperationId,
        salt: Hash32,
    },
    Cancel {
        id: OperationId,
    },
    UpdateDelay {
        new_delay: u64,
    },
    GrantRole {
        role: RoleId,
        account: Address,
    },
    RevokeRole {
        role: RoleId,
        account: Address,
    },
    RenounceRole {
        role: RoleId,
        account: Address,
    },
}

impl TimelockCall {
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }
}

/// Timelock with a role capability table.
#[derive(Clone, Debug)]
pub struct LockController {
    min_delay: u64,
    roles: RoleTable,
    timestamps: BTreeMap<OperationId, Timestamp>,
    initial_proposers: Vec<Address>,
    initial_executors: Vec<Address>,
    initial_admin: Option<Address>,
}

impl LockController {
    /// `admin` is an optional extra admin next to the controller itself,
    /// normally the deployer so it can wire roles before handing off.
    pub fn new(
        min_delay: u64,
        proposers: Vec<Address>,
        executors: Vec<Address>,
        admin: Option<Address>,
    ) -> Self {
        Self {
            min_delay,
            roles: RoleTable::new(),
            timestamps: BTreeMap::new(),
            initial_proposers: proposers,
            initial_executors: executors,
            initial_admin: admin,
        }
    }

    pub fn get_min_delay(&self) -> u64 {
        self.min_delay
    }

    /// An executor role held by the zero address opens execution to anyone.
    pub fn has_role(&self, role: &RoleId, account: &Address) -> bool {
        self.roles.has_role(role, account)
    }

    pub fn role_holders(&self, role: &RoleId) -> Vec<Address> {
        self.roles.holders(role).copied().collect()
    }

    pub fn get_timestamp(&self, id: &OperationId) -> Option<Timestamp> {
        self.timestamps.get(id).copied()
    }

    pub fn operation_state(&self, id: &OperationId, now: Timestamp) -> OperationState {
        OperationState::of(self.get_timestamp(id), now)
    }

    pub fn is_operation(&self, id: &OperationId) -> bool {
        self.timestamps.contains_key(id)
    }

    /// Scheduled and not yet executed.
    pub fn is_operation_pending(&self, id: &OperationId) -> bool {
        self.get_timestamp(id).is_some_and(|t| t != DONE_TIMESTAMP)
    }

    pub fn is_operation_ready(&self, id: &OperationId, now: Timestamp) -> bool {
        self.operation_state(id, now) == OperationState::Ready
    }

    pub fn is_operation_done(&self, id: &OperationId) -> bool {
        self.get_timestamp(id) == Some(DONE_TIMESTAMP)
    }

    fn check_role(&self, role: Role, account: Address) -> Result<(), TimelockError> {
        let id = role.id();
        if self.roles.has_role(&id, &account) {
            return Ok(());
        }
        Err(TimelockError::Unauthorized { account, role: id })
    }

    fn check_executor(&self, account: Address) -> Result<(), TimelockError> {
        if self.roles.has_role(&Role::Executor.id(), &Address::ZERO) {
            return Ok(());
        }
        self.check_role(Role::Executor, account)
    }

    fn grant(&mut self, ctx: &mut CallContext<'_>, role: RoleId, account: Address, sender: Address) {
        if self.roles.grant(role, account) {
            debug!(role = %role, %account, "role granted");
            ctx.emit(&RoleGranted {
                role,
                account,
                sender,
            });
        }
    }

    fn revoke(&mut self, ctx: &mut CallContext<'_>, role: RoleId, account: Address, sender: Address) {
        if self.roles.revoke(&role, &account) {
            debug!(role = %role, %account, "role revoked");
            ctx.emit(&RoleRevoked {
                role,
                account,
                sender,
            });
        }
    }

    fn schedule(
        &mut self,
        ctx: &mut CallContext<'_>,
        caller: Address,
        calls: Vec<Call>,
        id: OperationId,
        predecessor: OperationId,
        delay: u64,
    ) -> Result<(), TimelockError> {
        self.check_role(Role::Proposer, caller)?;
        if calls.is_empty() {
            return Err(TimelockError::InvalidOperationLength);
        }
        if self.is_operation(&id) {
            return Err(TimelockError::OperationAlreadyScheduled(id));
        }
        if delay < self.min_delay {
            return Err(TimelockError::DelayTooShort {
                requested: delay,
                minimum: self.min_delay,
            });
        }
        let ready_at = ctx.block().timestamp.plus_secs(delay);
        self.timestamps.insert(id, ready_at);
        info!(operation = %id, %ready_at, calls = calls.len(), "operation scheduled");
        for (index, call) in calls.into_iter().enumerate() {
            ctx.emit(&CallScheduled {
                id,
                index,
                call,
                predecessor,
                delay,
            });
        }
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &mut CallContext<'_>,
        caller: Address,
        calls: Vec<Call>,
        id: OperationId,
        predecessor: OperationId,
    ) -> Result<(), CallError> {
        self.check_executor(caller)?;
        if calls.is_empty() {
            return Err(TimelockError::InvalidOperationLength.into());
        }
        let now = ctx.block().timestamp;
        match self.operation_state(&id, now) {
            OperationState::Unset => return Err(TimelockError::UnknownOperation(id).into()),
            OperationState::Done => return Err(TimelockError::AlreadyExecuted(id).into()),
            OperationState::Waiting => {
                let ready_at = self.get_timestamp(&id).unwrap_or(now);
                return Err(TimelockError::NotReady { id, ready_at, now }.into());
            }
            OperationState::Ready => {}
        }
        if !predecessor.is_zero() && !self.is_operation_done(&predecessor) {
            return Err(TimelockError::PredecessorNotExecuted(predecessor).into());
        }

        for (index, call) in calls.into_iter().enumerate() {
            self.run_call(ctx, &call)
                .map_err(|source| TimelockError::OperationReverted { index, source })?;
            ctx.emit(&CallExecuted { id, index, call });
        }
        self.timestamps.insert(id, DONE_TIMESTAMP);
        info!(operation = %id, "operation executed");
        Ok(())
    }

    /// Calls addressed to the controller itself are applied in place with
    /// the controller as caller.
    fn run_call(&mut self, ctx: &mut CallContext<'_>, call: &Call) -> Result<Vec<u8>, CallError> {
        if call.target == ctx.this() {
            let inner = codec::decode::<TimelockCall>(&call.data)?;
            let this = ctx.this();
            return self.apply(ctx, this, inner);
        }
        ctx.call(call.target, call.value, &call.data)
    }

    fn apply(
        &mut self,
        ctx: &mut CallContext<'_>,
        caller: Address,
        call: TimelockCall,
    ) -> Result<Vec<u8>, CallError> {
        match call {
            TimelockCall::Schedule {
                call,
                predecessor,
                salt,
                delay,
            } => {
                let id = hash_operation(&call, &predecessor, &salt);
                self.schedule(ctx, caller, vec![call], id, predecessor, delay)?;
                Ok(codec::encode(&id))
            }
            TimelockCall::ScheduleBatch {
                calls,
                predecessor,
                salt,
                delay,
            } => {
                let id = hash_operation_batch(&calls, &predecessor, &salt);
                self.schedule(ctx, caller, calls, id, predecessor, delay)?;
                Ok(codec::encode(&id))
            }
            TimelockCall::Execute {
                call,
                predecessor,
                salt,
            } => {
                let id = hash_operation(&call, &predecessor, &salt);
                self.execute(ctx, caller, vec![call], id, predecessor)?;
                Ok(codec::encode(&id))
            }
            TimelockCall::ExecuteBatch {
                calls,
                predecessor,
                salt,
            } => {
                let id = hash_operation_batch(&calls, &predecessor, &salt);
                self.execute(ctx, caller, calls, id, predecessor)?;
                Ok(codec::encode(&id))
            }
            TimelockCall::Cancel { id } => {
                self.check_role(Role::Canceller, caller)?;
                if !self.is_operation_pending(&id) {
                    return Err(TimelockError::NotCancellable(id).into());
                }
                self.timestamps.remove(&id);
                info!(operation = %id, "operation cancelled");
                ctx.emit(&Cancelled { id });
                Ok(Vec::new())
            }
            TimelockCall::UpdateDelay { new_delay } => {
                if caller != ctx.this() {
                    return Err(TimelockError::OnlySelf.into());
                }
                ctx.emit(&MinDelayChange {
                    old_duration: self.min_delay,
                    new_duration: new_delay,
                });
                info!(old = self.min_delay, new = new_delay, "min delay updated");
                self.min_delay = new_delay;
                Ok(Vec::new())
            }
            TimelockCall::GrantRole { role, account } => {
                let admin = self.roles.admin_of(&role);
                if !self.roles.has_role(&admin, &caller) {
                    return Err(TimelockError::Unauthorized {
                        account: caller,
                        role: admin,
                    }
                    .into());
                }
                self.grant(ctx, role, account, caller);
                Ok(Vec::new())
            }
            TimelockCall::RevokeRole { role, account } => {
                let admin = self.roles.admin_of(&role);
                if !self.roles.has_role(&admin, &caller) {
                    return Err(TimelockError::Unauthorized {
                        account: caller,
                        role: admin,
                    }
                    .into());
                }
                self.revoke(ctx, role, account, caller);
                Ok(Vec::new())
            }
            TimelockCall::RenounceRole { role, account } => {
                if account != caller {
                    return Err(TimelockError::RenounceForOther.into());
                }
                self.revoke(ctx, role, account, caller);
                Ok(Vec::new())
            }
        }
    }
}

impl Contract for LockController {
    fn name(&self) -> &'static str {
        "LockController"
    }

    fn deployed(&mut self, ctx: &mut CallContext<'_>) -> Result<(), CallError> {
        let deployer = ctx.sender();
        let this = ctx.this();
        let admin = Role::Admin.id();
        self.grant(ctx, admin, this, deployer);
        if let Some(extra) = self.initial_admin {
            self.grant(ctx, admin, extra, deployer);
        }
        for proposer in std::mem::take(&mut self.initial_proposers) {
            self.grant(ctx, Role::Proposer.id(), proposer, deployer);
            self.grant(ctx, Role::Canceller.id(), proposer, deployer);
        }
        for executor in std::mem::take(&mut self.initial_executors) {
            self.grant(ctx, Role::Executor.id(), executor, deployer);
        }
        ctx.emit(&MinDelayChange {
            old_duration: 0,
            new_duration: self.min_delay,
        });
        Ok(())
    }

    fn handle(&mut self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, CallError> {
        if calldata.is_empty() {
            return Ok(Vec::new());
        }
        let call = codec::decode::<TimelockCall>(calldata)?;
        let caller = ctx.sender();
        let payable = matches!(
            call,
            TimelockCall::Execute { .. } | TimelockCall::ExecuteBatch { .. }
        );
        if !payable {
            ctx.require_no_value()?;
        }
        self.apply(ctx, caller, call)
    }

    fn clone_box(&self) -> Box<dyn Contract> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
