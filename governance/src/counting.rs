//! Simple For/Against/Abstain vote counting.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use village_types::{Address, Amount};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteType {
    Against = 0,
    For = 1,
    Abstain = 2,
}

impl TryFrom<u8> for VoteType {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(Self::Against),
            1 => Ok(Self::For),
            2 => Ok(Self::Abstain),
            other => Err(other),
        }
    }
}

/// Tallies for one proposal. Counters only ever grow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProposalVote {
    pub against_votes: Amount,
    pub for_votes: Amount,
    pub abstain_votes: Amount,
    voters: BTreeSet<Address>,
}

impl ProposalVote {
    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voters.contains(voter)
    }

    /// Record a vote. Returns `false` (and changes nothing) if `voter` has
    /// already voted.
    pub fn count(&mut self, voter: Address, support: VoteType, weight: Amount) -> bool {
        if !self.voters.insert(voter) {
            return false;
        }
        let tally = match support {
            VoteType::Against => &mut self.against_votes,
            VoteType::For => &mut self.for_votes,
            VoteType::Abstain => &mut self.abstain_votes,
        };
        *tally = tally.checked_add(weight).unwrap_or(Amount::new(u128::MAX));
        true
    }

    /// For and Abstain both count toward quorum.
    pub fn quorum_reached(&self, quorum: Amount) -> bool {
        let participating = self
            .for_votes
            .checked_add(self.abstain_votes)
            .unwrap_or(Amount::new(u128::MAX));
        quorum <= participating
    }

    pub fn vote_succeeded(&self) -> bool {
        self.for_votes > self.against_votes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn second_vote_changes_nothing() {
        let mut votes = ProposalVote::default();
        assert!(votes.count(voter(1), VoteType::For, Amount::new(10)));
        let before = votes.clone();
        assert!(!votes.count(voter(1), VoteType::Against, Amount::new(50)));
        assert_eq!(votes, before);
    }

    #[test]
    fn abstain_counts_for_quorum_not_outcome() {
        let mut votes = ProposalVote::default();
        votes.count(voter(1), VoteType::Abstain, Amount::new(100));
        votes.count(voter(2), VoteType::For, Amount::new(1));
        assert!(votes.quorum_reached(Amount::new(101)));
        assert!(!votes.quorum_reached(Amount::new(102)));
        assert!(votes.vote_succeeded());
    }

    #[test]
    fn tie_is_not_success() {
        let mut votes = ProposalVote::default();
        votes.count(voter(1), VoteType::For, Amount::new(5));
        votes.count(voter(2), VoteType::Against, Amount::new(5));
        assert!(!votes.vote_succeeded());
    }

    #[test]
    fn vote_type_from_u8() {
        assert_eq!(VoteType::try_from(1), Ok(VoteType::For));
        assert_eq!(VoteType::try_from(3), Err(3));
    }
}
