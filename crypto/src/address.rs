//! Address derivation.
//!
//! Contract addresses follow the CREATE scheme: the tail of
//! `Blake2b-256(deployer || nonce)`. Development accounts are derived from a
//! fixed label so test fixtures get stable addresses.

use crate::hash::{hash_bytes, hash_parts};
use village_types::Address;

/// Address of the contract created by `deployer` at account nonce `nonce`.
pub fn contract_address(deployer: &Address, nonce: u64) -> Address {
    let digest = hash_parts(&[deployer.as_bytes(), &nonce.to_be_bytes()]);
    Address::from_hash(&digest)
}

/// Deterministic development account number `index` (deployer is 0).
pub fn dev_account(index: u32) -> Address {
    let label = format!("village-dev-account-{index}");
    Address::from_hash(&hash_bytes(label.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_changes_contract_address() {
        let deployer = dev_account(0);
        assert_ne!(contract_address(&deployer, 0), contract_address(&deployer, 1));
        assert_eq!(contract_address(&deployer, 3), contract_address(&deployer, 3));
    }

    #[test]
    fn dev_accounts_are_distinct_and_nonzero() {
        let a = dev_account(0);
        let b = dev_account(1);
        assert_ne!(a, b);
        assert!(!a.is_zero());
    }
}
