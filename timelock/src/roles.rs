//! Role capability table.
//!
//! Roles are modelled as a table of role id to holder set, not as types. The
//! admin role administers every role, including itself.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use village_crypto::hash_text;
use village_ledger::EventData;
use village_types::{Address, RoleId};

/// The well-known roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Proposer,
    Executor,
    Canceller,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Proposer, Role::Executor, Role::Canceller];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "TIMELOCK_ADMIN_ROLE",
            Self::Proposer => "PROPOSER_ROLE",
            Self::Executor => "EXECUTOR_ROLE",
            Self::Canceller => "CANCELLER_ROLE",
        }
    }

    /// Role id: the hash of the role name.
    pub fn id(&self) -> RoleId {
        hash_text(self.as_str())
    }

    pub fn from_id(id: &RoleId) -> Option<Role> {
        Self::ALL.into_iter().find(|r| r.id() == *id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGranted {
    pub role: RoleId,
    pub account: Address,
    pub sender: Address,
}

impl EventData for RoleGranted {
    const NAME: &'static str = "RoleGranted";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRevoked {
    pub role: RoleId,
    pub account: Address,
    pub sender: Address,
}

impl EventData for RoleRevoked {
    const NAME: &'static str = "RoleRevoked";
}

/// Role id to holders.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleTable {
    members: BTreeMap<RoleId, BTreeSet<Address>>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_role(&self, role: &RoleId, account: &Address) -> bool {
        self.members
            .get(role)
            .is_some_and(|holders| holders.contains(account))
    }

    /// Returns `true` if the account did not already hold the role.
    pub fn grant(&mut self, role: RoleId, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    /// Returns `true` if the account held the role.
    pub fn revoke(&mut self, role: &RoleId, account: &Address) -> bool {
        let Some(holders) = self.members.get_mut(role) else {
            return false;
        };
        let removed = holders.remove(account);
        if holders.is_empty() {
            self.members.remove(role);
        }
        removed
    }

    pub fn holders(&self, role: &RoleId) -> impl Iterator<Item = &Address> {
        self.members.get(role).into_iter().flatten()
    }

    /// The role whose holders may grant and revoke `role`.
    pub fn admin_of(&self, _role: &RoleId) -> RoleId {
        Role::Admin.id()
    }
}
