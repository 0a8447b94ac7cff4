//! Block height and time.
//!
//! Time only advances when you tell it to: mining a block moves the height by
//! one and the timestamp by at least one second; [`ChainClock::increase_time`]
//! stretches the gap before the next block.

use serde::{Deserialize, Serialize};
use village_types::{BlockNumber, Timestamp};

/// Block environment visible to a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEnv {
    pub number: BlockNumber,
    pub timestamp: Timestamp,
}

/// A deterministic chain clock.
#[derive(Clone, Debug)]
pub struct ChainClock {
    number: BlockNumber,
    timestamp: Timestamp,
    /// Extra seconds to add before the next block.
    time_offset: u64,
}

impl ChainClock {
    pub fn new(genesis_time: Timestamp) -> Self {
        Self {
            number: BlockNumber::GENESIS,
            timestamp: genesis_time,
            time_offset: 0,
        }
    }

    /// The latest mined block.
    pub fn current(&self) -> BlockEnv {
        BlockEnv {
            number: self.number,
            timestamp: self.timestamp,
        }
    }

    /// The block the next transaction will be mined in.
    pub fn pending(&self) -> BlockEnv {
        BlockEnv {
            number: self.number.next(),
            timestamp: self.timestamp.plus_secs(self.time_offset.max(1)),
        }
    }

    /// Seal `block` as the latest block.
    pub fn commit(&mut self, block: BlockEnv) {
        self.number = block.number;
        self.timestamp = block.timestamp;
        self.time_offset = 0;
    }

    /// Mine `count` empty blocks.
    pub fn mine(&mut self, count: u64) {
        for _ in 0..count {
            let block = self.pending();
            self.commit(block);
        }
    }

    /// Push the next block's timestamp `secs` further into the future.
    pub fn increase_time(&mut self, secs: u64) {
        self.time_offset = self.time_offset.saturating_add(secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mining_advances_height_and_time() {
        let mut clock = ChainClock::new(Timestamp::new(1_000));
        clock.mine(3);
        assert_eq!(clock.current().number, BlockNumber::new(3));
        assert_eq!(clock.current().timestamp, Timestamp::new(1_003));
    }

    #[test]
    fn increase_time_applies_to_next_block_only() {
        let mut clock = ChainClock::new(Timestamp::new(1_000));
        clock.increase_time(3_600);
        assert_eq!(clock.current().timestamp, Timestamp::new(1_000));
        clock.mine(1);
        assert_eq!(clock.current().timestamp, Timestamp::new(4_600));
        clock.mine(1);
        assert_eq!(clock.current().timestamp, Timestamp::new(4_601));
    }

    #[test]
    fn pending_does_not_mutate() {
        let clock = ChainClock::new(Timestamp::new(10));
        let pending = clock.pending();
        assert_eq!(pending.number, BlockNumber::new(1));
        assert_eq!(clock.current().number, BlockNumber::GENESIS);
    }
}
