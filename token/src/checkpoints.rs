//! Block-indexed value history.

use serde::{Deserialize, Serialize};
use village_types::{Amount, BlockNumber};

/// Value in effect from `from_block` until the next checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub from_block: BlockNumber,
    pub votes: Amount,
}

/// A history of values ordered by block. At most one checkpoint per block:
/// writes within the same block overwrite the latest entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoints {
    history: Vec<Checkpoint>,
}

impl Checkpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn get(&self, pos: usize) -> Option<Checkpoint> {
        self.history.get(pos).copied()
    }

    /// The most recent value, zero if nothing was ever recorded.
    pub fn latest(&self) -> Amount {
        self.history.last().map(|c| c.votes).unwrap_or(Amount::ZERO)
    }

    /// Record `votes` as of `block`. Blocks must not go backwards.
    pub fn push(&mut self, block: BlockNumber, votes: Amount) {
        match self.history.last_mut() {
            Some(last) if last.from_block == block => last.votes = votes,
            Some(last) => {
                debug_assert!(last.from_block < block, "checkpoint blocks must increase");
                self.history.push(Checkpoint {
                    from_block: block,
                    votes,
                });
            }
            None => self.history.push(Checkpoint {
                from_block: block,
                votes,
            }),
        }
    }

    /// Value in effect at the end of `block`: the last checkpoint whose
    /// `from_block <= block`, or zero if there is none.
    pub fn upper_lookup(&self, block: BlockNumber) -> Amount {
        let idx = self.history.partition_point(|c| c.from_block <= block);
        if idx == 0 {
            Amount::ZERO
        } else {
            self.history[idx - 1].votes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(n: u64) -> BlockNumber {
        BlockNumber::new(n)
    }

    #[test]
    fn lookup_before_first_checkpoint_is_zero() {
        let mut cp = Checkpoints::new();
        cp.push(b(5), Amount::new(10));
        assert_eq!(cp.upper_lookup(b(4)), Amount::ZERO);
        assert_eq!(cp.upper_lookup(b(5)), Amount::new(10));
        assert_eq!(cp.upper_lookup(b(99)), Amount::new(10));
    }

    #[test]
    fn same_block_overwrites() {
        let mut cp = Checkpoints::new();
        cp.push(b(3), Amount::new(1));
        cp.push(b(3), Amount::new(2));
        assert_eq!(cp.len(), 1);
        assert_eq!(cp.latest(), Amount::new(2));
    }

    #[test]
    fn lookup_picks_the_value_in_effect() {
        let mut cp = Checkpoints::new();
        cp.push(b(1), Amount::new(100));
        cp.push(b(4), Amount::new(40));
        cp.push(b(9), Amount::new(90));
        assert_eq!(cp.upper_lookup(b(3)), Amount::new(100));
        assert_eq!(cp.upper_lookup(b(4)), Amount::new(40));
        assert_eq!(cp.upper_lookup(b(8)), Amount::new(40));
        assert_eq!(cp.get(2), Some(Checkpoint { from_block: b(9), votes: Amount::new(90) }));
        assert_eq!(cp.get(3), None);
    }
}
