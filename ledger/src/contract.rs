//! The contract interface the ledger dispatches to.

use std::any::Any;

use crate::context::CallContext;
use crate::error::CallError;

/// A contract living at an address on the ledger.
///
/// `handle` receives encoded calldata and returns encoded return data. Any
/// error aborts the call and every state change made beneath it.
pub trait Contract: Any {
    /// Contract name, used in logs and type-mismatch errors.
    fn name(&self) -> &'static str;

    /// Constructor hook, run once inside the deployment transaction.
    fn deployed(&mut self, _ctx: &mut CallContext<'_>) -> Result<(), CallError> {
        Ok(())
    }

    /// Execute one call.
    fn handle(&mut self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, CallError>;

    fn clone_box(&self) -> Box<dyn Contract>;

    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Contract> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Downcast a stored contract to its concrete type.
pub(crate) fn downcast<'a, T: Contract>(
    contract: &'a dyn Contract,
    address: village_types::Address,
) -> Result<&'a T, CallError> {
    contract
        .as_any()
        .downcast_ref::<T>()
        .ok_or(CallError::WrongContract {
            address,
            expected: std::any::type_name::<T>(),
        })
}
