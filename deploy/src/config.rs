//! Deployment configuration with TOML file support and `.env`-style
//! environment overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use village_governance::GovernorSettings;
use village_types::{Amount, NetworkId};

use crate::DeployError;

pub const ENV_NETWORK: &str = "VILLAGE_NETWORK";
pub const ENV_RPC_URL: &str = "VILLAGE_RPC_URL";
pub const ENV_PRIVATE_KEY: &str = "PRIVATE_KEY";
pub const ENV_EXPLORER_API_KEY: &str = "ETHERSCAN_API_KEY";

/// Configuration for one deployment run.
///
/// Can be loaded from a TOML file via [`DeployConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid development configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Which network to deploy to.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// JSON-RPC endpoint of a live network.
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Signer key. Never written back out.
    #[serde(default, skip_serializing)]
    pub private_key: Option<String>,

    /// Block explorer API key; enables source verification on live networks.
    #[serde(default, skip_serializing)]
    pub explorer_api_key: Option<String>,

    /// Blocks to wait after each deployment (defaults per network).
    #[serde(default)]
    pub block_confirmations: Option<u64>,

    /// Timestamp of the development chain's genesis block.
    #[serde(default = "default_genesis_timestamp")]
    pub genesis_timestamp: u64,

    #[serde(default = "default_token_name")]
    pub token_name: String,

    #[serde(default = "default_token_symbol")]
    pub token_symbol: String,

    /// Governance tokens minted to the deployer, in whole tokens.
    #[serde(default = "default_initial_supply")]
    pub initial_supply: u64,

    /// Lock controller minimum delay in seconds.
    #[serde(default = "default_min_delay")]
    pub min_delay: u64,

    /// Blocks between proposal and snapshot.
    #[serde(default = "default_voting_delay")]
    pub voting_delay: u64,

    /// Blocks a vote stays open.
    #[serde(default = "default_voting_period")]
    pub voting_period: u64,

    #[serde(default = "default_quorum_percentage")]
    pub quorum_percentage: u64,

    /// Votes needed to propose, in whole tokens.
    #[serde(default)]
    pub proposal_threshold: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Hardhat
}

fn default_genesis_timestamp() -> u64 {
    1_700_000_000
}

fn default_token_name() -> String {
    "Cowries".to_string()
}

fn default_token_symbol() -> String {
    "CWR".to_string()
}

fn default_initial_supply() -> u64 {
    1_000_000
}

fn default_min_delay() -> u64 {
    3_600
}

fn default_voting_delay() -> u64 {
    1
}

fn default_voting_period() -> u64 {
    5
}

fn default_quorum_percentage() -> u64 {
    4
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DeployConfig {
    /// Configuration for `network` with every other field defaulted.
    pub fn for_network(network: NetworkId) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, DeployError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeployError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DeployError> {
        toml::from_str(s).map_err(|e| DeployError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string. Secrets are omitted.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("DeployConfig is always serializable to TOML")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), DeployError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), DeployError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(network) = get(ENV_NETWORK) {
            self.network = network
                .parse()
                .map_err(|e| DeployError::Config(format!("{ENV_NETWORK}: {e}")))?;
        }
        if let Some(url) = get(ENV_RPC_URL) {
            self.rpc_url = Some(url);
        }
        if let Some(key) = get(ENV_PRIVATE_KEY) {
            self.private_key = Some(key);
        }
        if let Some(key) = get(ENV_EXPLORER_API_KEY) {
            self.explorer_api_key = Some(key);
        }
        Ok(())
    }

    /// Blocks to mine after each deployment transaction.
    pub fn confirmations(&self) -> u64 {
        self.block_confirmations
            .unwrap_or_else(|| self.network.default_confirmations())
            .max(1)
    }

    /// Source verification runs on live networks with an explorer key.
    pub fn should_verify(&self) -> bool {
        !self.network.is_development() && self.explorer_api_key.is_some()
    }

    pub fn initial_supply_amount(&self) -> Amount {
        Amount::ether(u128::from(self.initial_supply))
    }

    pub fn governor_settings(&self) -> GovernorSettings {
        GovernorSettings {
            voting_delay: self.voting_delay,
            voting_period: self.voting_period,
            proposal_threshold: Amount::ether(u128::from(self.proposal_threshold)),
            quorum_percentage: u128::from(self.quorum_percentage),
            ..GovernorSettings::default()
        }
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        self.governor_settings()
            .validate()
            .map_err(|e| DeployError::Config(e.to_string()))?;
        if self.initial_supply == 0 {
            return Err(DeployError::Config("initial supply must be positive".into()));
        }
        if !self.network.is_development() && self.private_key.is_none() {
            return Err(DeployError::Config(format!(
                "network {} needs {ENV_PRIVATE_KEY}",
                self.network
            )));
        }
        Ok(())
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            rpc_url: None,
            private_key: None,
            explorer_api_key: None,
            block_confirmations: None,
            genesis_timestamp: default_genesis_timestamp(),
            token_name: default_token_name(),
            token_symbol: default_token_symbol(),
            initial_supply: default_initial_supply(),
            min_delay: default_min_delay(),
            voting_delay: default_voting_delay(),
            voting_period: default_voting_period(),
            quorum_percentage: default_quorum_percentage(),
            proposal_threshold: 0,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
