//! Single-owner access control for asset contracts.

use serde::{Deserialize, Serialize};
use village_types::Address;

use crate::context::CallContext;
use crate::error::CallError;
use crate::event::EventData;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipTransferred {
    pub previous_owner: Address,
    pub new_owner: Address,
}

impl EventData for OwnershipTransferred {
    const NAME: &'static str = "OwnershipTransferred";
}

/// The owner slot of an `Ownable` contract.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Make the deployer the owner. Call from the constructor hook.
    pub fn initialize(&mut self, ctx: &mut CallContext<'_>) {
        let deployer = ctx.sender();
        self.set_owner(ctx, deployer);
    }

    pub fn only_owner(&self, caller: Address) -> Result<(), CallError> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(CallError::NotOwner)
        }
    }

    pub fn transfer_ownership(
        &mut self,
        ctx: &mut CallContext<'_>,
        new_owner: Address,
    ) -> Result<(), CallError> {
        self.only_owner(ctx.sender())?;
        if new_owner.is_zero() {
            return Err(CallError::ZeroOwner);
        }
        self.set_owner(ctx, new_owner);
        Ok(())
    }

    fn set_owner(&mut self, ctx: &mut CallContext<'_>, new_owner: Address) {
        let previous_owner = std::mem::replace(&mut self.owner, new_owner);
        ctx.emit(&OwnershipTransferred {
            previous_owner,
            new_owner,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec, Contract, Ledger};
    use serde::{Deserialize, Serialize};
    use std::any::Any;
    use village_types::{Amount, Timestamp};

    #[derive(Clone, Default)]
    struct Vault {
        ownable: Ownable,
        setting: u64,
    }

    #[derive(Serialize, Deserialize)]
    enum VaultCall {
        Set(u64),
        TransferOwnership(Address),
    }

    impl Contract for Vault {
        fn name(&self) -> &'static str {
            "Vault"
        }

        fn deployed(&mut self, ctx: &mut CallContext<'_>) -> Result<(), CallError> {
            self.ownable.initialize(ctx);
            Ok(())
        }

        fn handle(&mut self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, CallError> {
            match codec::decode::<VaultCall>(calldata)? {
                VaultCall::Set(v) => {
                    self.ownable.only_owner(ctx.sender())?;
                    self.setting = v;
                }
                VaultCall::TransferOwnership(to) => self.ownable.transfer_ownership(ctx, to)?,
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

    fn alice() -> Address {
        Address::new([0xa1; 20])
    }

    fn bob() -> Address {
        Address::new([0xb0; 20])
    }

    #[test]
    fn deployer_owns_and_can_hand_over() {
        let mut ledger = Ledger::new(Timestamp::new(0));
        let deployed = ledger.deploy(alice(), Vault::default()).unwrap();
        let vault = deployed.address;
        let first = deployed.receipt.event::<OwnershipTransferred>().unwrap();
        assert_eq!(first.previous_owner, Address::ZERO);
        assert_eq!(first.new_owner, alice());

        let set = codec::encode(&VaultCall::Set(5));
        assert!(matches!(
            ledger.transact(bob(), vault, Amount::ZERO, &set),
            Err(CallError::NotOwner)
        ));
        ledger.transact(alice(), vault, Amount::ZERO, &set).unwrap();

        let handover = codec::encode(&VaultCall::TransferOwnership(bob()));
        ledger.transact(alice(), vault, Amount::ZERO, &handover).unwrap();
        assert_eq!(ledger.contract::<Vault>(vault).unwrap().ownable.owner(), bob());
        assert!(ledger.transact(alice(), vault, Amount::ZERO, &set).is_err());
    }

    #[test]
    fn zero_owner_is_rejected() {
        let mut ledger = Ledger::new(Timestamp::new(0));
        let vault = ledger.deploy(alice(), Vault::default()).unwrap().address;
        let call = codec::encode(&VaultCall::TransferOwnership(Address::ZERO));
        assert!(matches!(
            ledger.transact(alice(), vault, Amount::ZERO, &call),
            Err(CallError::ZeroOwner)
        ));
    }
}
