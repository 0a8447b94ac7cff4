//! Named record of everything a deployment run has put on the ledger.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Serialize, Serializer};
use village_types::{Address, BlockNumber};

use crate::DeployError;

fn as_display<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeploymentRecord {
    pub name: String,
    #[serde(serialize_with = "as_display")]
    pub address: Address,
    /// Constructor arguments as passed to source verification.
    pub args: Vec<String>,
    pub block: BlockNumber,
}

/// Deployments by contract name, remembering insertion order.
#[derive(Clone, Debug, Default)]
pub struct Deployments {
    records: BTreeMap<String, DeploymentRecord>,
    order: Vec<String>,
}

impl Deployments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Result<&DeploymentRecord, DeployError> {
        self.records
            .get(name)
            .ok_or_else(|| DeployError::UnknownDeployment(name.to_string()))
    }

    pub fn address(&self, name: &str) -> Result<Address, DeployError> {
        self.get(name).map(|r| r.address)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Record a deployment; a redeployment under the same name replaces the
    /// address but keeps the original position.
    pub fn insert(&mut self, record: DeploymentRecord) {
        if !self.records.contains_key(&record.name) {
            self.order.push(record.name.clone());
        }
        self.records.insert(record.name.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in deployment order.
    pub fn iter(&self) -> impl Iterator<Item = &DeploymentRecord> {
        self.order.iter().filter_map(|name| self.records.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, byte: u8) -> DeploymentRecord {
        DeploymentRecord {
            name: name.to_string(),
            address: Address::new([byte; 20]),
            args: vec![],
            block: BlockNumber::new(u64::from(byte)),
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        let deployments = Deployments::new();
        assert!(matches!(
            deployments.get("Fisch"),
            Err(DeployError::UnknownDeployment(name)) if name == "Fisch"
        ));
    }

    #[test]
    fn iterates_in_insertion_order() {
        let mut deployments = Deployments::new();
        deployments.insert(record("LockController", 2));
        deployments.insert(record("CowriesToken", 1));
        deployments.insert(record("LockController", 3));
        let names: Vec<_> = deployments.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["LockController", "CowriesToken"]);
        assert_eq!(deployments.address("LockController").unwrap(), Address::new([3; 20]));
        assert_eq!(deployments.len(), 2);
    }
}
