//! The VillageSquare lock controller (timelock).
//!
//! Holds a capability table of roles (proposer, executor, canceller, admin)
//! and a delay gate: operations are scheduled with at least `min_delay`
//! seconds of notice and run all-or-nothing once ready. The controller is
//! always its own admin, so once the deployer's admin role is revoked, roles
//! and the delay can only change through an operation executed by itself.

pub mod controller;
pub mod error;
pub mod operation;
pub mod roles;

pub use controller::{
    CallExecuted, CallScheduled, Cancelled, LockController, MinDelayChange, TimelockCall,
};
pub use error::TimelockError;
pub use operation::{hash_operation, hash_operation_batch, Call, OperationState, DONE_TIMESTAMP};
pub use roles::{Role, RoleGranted, RoleRevoked, RoleTable};
