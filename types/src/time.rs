//! Block timestamps.
//!
//! Seconds since the Unix epoch, always read from the current block header.
//! Nothing in the ledger consults the wall clock.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Deadline `secs` after this timestamp. Saturates at `u64::MAX`.
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// True once `now` is at or beyond `self + window`.
    pub fn has_expired(&self, window: u64, now: Timestamp) -> bool {
        now >= self.plus_secs(window)
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t+{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_saturates() {
        assert_eq!(Timestamp::new(u64::MAX - 1).plus_secs(10).as_secs(), u64::MAX);
    }

    #[test]
    fn grace_window_is_inclusive() {
        let eta = Timestamp::new(1_000);
        assert!(!eta.has_expired(50, Timestamp::new(1_049)));
        assert!(eta.has_expired(50, Timestamp::new(1_050)));
    }
}
