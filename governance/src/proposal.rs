//! Proposal records, ids and states.

use serde::{Deserialize, Serialize};
use village_crypto::hash_bytes;
use village_ledger::codec;
use village_timelock::Call;
use village_types::{Address, Amount, BlockNumber, Hash32, ProposalId, Timestamp};

use crate::error::GovernorError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl ProposalState {
    /// Defeated, Canceled, Expired and Executed never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Defeated | Self::Canceled | Self::Expired | Self::Executed
        )
    }
}

/// Parallel target/value/calldata arrays of a proposal, validated to have
/// equal, non-zero length.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalBatch {
    targets: Vec<Address>,
    values: Vec<Amount>,
    calldatas: Vec<Vec<u8>>,
}

impl ProposalBatch {
    pub fn new(
        targets: Vec<Address>,
        values: Vec<Amount>,
        calldatas: Vec<Vec<u8>>,
    ) -> Result<Self, GovernorError> {
        if targets.is_empty() || targets.len() != values.len() || targets.len() != calldatas.len() {
            return Err(GovernorError::InvalidProposalLength {
                targets: targets.len(),
                values: values.len(),
                calldatas: calldatas.len(),
            });
        }
        Ok(Self {
            targets,
            values,
            calldatas,
        })
    }

    pub fn targets(&self) -> &[Address] {
        &self.targets
    }

    pub fn values(&self) -> &[Amount] {
        &self.values
    }

    pub fn calldatas(&self) -> &[Vec<u8>] {
        &self.calldatas
    }

    /// The batch as timelock calls, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.targets
            .iter()
            .zip(&self.values)
            .zip(&self.calldatas)
            .map(|((target, value), data)| Call::new(*target, *value, data.clone()))
            .collect()
    }

    pub fn id(&self, description_hash: &Hash32) -> ProposalId {
        hash_proposal(&self.targets, &self.values, &self.calldatas, description_hash)
    }
}

/// Proposal id: a pure function of the calls and the description hash, so
/// anyone can recompute it.
pub fn hash_proposal(
    targets: &[Address],
    values: &[Amount],
    calldatas: &[Vec<u8>],
    description_hash: &Hash32,
) -> ProposalId {
    let encoded = codec::encode(&(targets, values, calldatas, description_hash));
    hash_bytes(&encoded)
}

/// Stored proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalCore {
    pub proposer: Address,
    pub batch: ProposalBatch,
    pub description_hash: Hash32,
    pub snapshot: BlockNumber,
    pub deadline: BlockNumber,
    pub eta: Option<Timestamp>,
    pub canceled: bool,
    pub executed: bool,
}
