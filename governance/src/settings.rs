//! Governor parameters.

use serde::{Deserialize, Serialize};
use village_types::Amount;

use crate::error::GovernorError;

/// Tunable parameters of the governor. Block counts are in blocks, grace
/// windows as noted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorSettings {
    /// Blocks between proposal creation and the snapshot block.
    #[serde(default = "default_voting_delay")]
    pub voting_delay: u64,

    /// Blocks the vote stays open after the snapshot.
    #[serde(default = "default_voting_period")]
    pub voting_period: u64,

    /// Minimum votes a proposer needs one block before proposing.
    #[serde(default)]
    pub proposal_threshold: Amount,

    /// Quorum as a percentage of total supply at the snapshot.
    #[serde(default = "default_quorum_percentage")]
    pub quorum_percentage: u128,

    /// Blocks after the deadline a succeeded proposal may still be queued.
    #[serde(default = "default_grace_period_blocks")]
    pub grace_period_blocks: u64,

    /// Seconds after its eta a queued proposal may still be executed.
    #[serde(default = "default_queue_grace_period_secs")]
    pub queue_grace_period_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_voting_delay() -> u64 {
    1
}

fn default_voting_period() -> u64 {
    5
}

fn default_quorum_percentage() -> u128 {
    4
}

fn default_grace_period_blocks() -> u64 {
    50_400
}

fn default_queue_grace_period_secs() -> u64 {
    14 * 24 * 60 * 60
}

impl Default for GovernorSettings {
    fn default() -> Self {
        Self {
            voting_delay: default_voting_delay(),
            voting_period: default_voting_period(),
            proposal_threshold: Amount::ZERO,
            quorum_percentage: default_quorum_percentage(),
            grace_period_blocks: default_grace_period_blocks(),
            queue_grace_period_secs: default_queue_grace_period_secs(),
        }
    }
}

impl GovernorSettings {
    pub fn validate(&self) -> Result<(), GovernorError> {
        if self.voting_period == 0 {
            return Err(GovernorError::InvalidSettings(
                "voting period must be at least one block".into(),
            ));
        }
        if self.quorum_percentage > 100 {
            return Err(GovernorError::InvalidSettings(format!(
                "quorum {}% exceeds 100%",
                self.quorum_percentage
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GovernorSettings::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_period_and_oversized_quorum() {
        let mut s = GovernorSettings {
            voting_period: 0,
            ..Default::default()
        };
        assert!(s.validate().is_err());
        s.voting_period = 5;
        s.quorum_percentage = 101;
        assert!(matches!(s.validate(), Err(GovernorError::InvalidSettings(_))));
    }
}
