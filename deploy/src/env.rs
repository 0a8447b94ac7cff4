//! The ledger, accounts and registry a deployment run works against.

use tracing::{debug, info, warn};
use village_crypto::dev_account;
use village_ledger::{Contract, Ledger, Receipt};
use village_types::{Address, Amount, Timestamp};

use crate::config::DeployConfig;
use crate::registry::{DeploymentRecord, Deployments};
use crate::verify::{RecordingVerifier, SourceVerifier, VerificationRequest};
use crate::DeployError;

/// Native balance each development account starts with.
pub const DEV_ACCOUNT_BALANCE: u128 = 10_000;

/// Well-known accounts of the development chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NamedAccounts {
    pub deployer: Address,
    pub liquidator: Address,
    pub borrower: Address,
}

impl NamedAccounts {
    pub fn dev() -> Self {
        Self {
            deployer: dev_account(0),
            liquidator: dev_account(1),
            borrower: dev_account(2),
        }
    }

    pub fn all(&self) -> [Address; 3] {
        [self.deployer, self.liquidator, self.borrower]
    }
}

pub struct DeployEnv {
    pub ledger: Ledger,
    pub config: DeployConfig,
    pub accounts: NamedAccounts,
    pub deployments: Deployments,
    verifier: Box<dyn SourceVerifier>,
}

impl DeployEnv {
    /// A fresh development ledger with funded named accounts.
    pub fn new(config: DeployConfig) -> Result<Self, DeployError> {
        config.validate()?;
        let mut ledger = Ledger::new(Timestamp::new(config.genesis_timestamp));
        let accounts = NamedAccounts::dev();
        for account in accounts.all() {
            ledger.fund(account, Amount::ether(DEV_ACCOUNT_BALANCE));
        }
        Ok(Self {
            ledger,
            config,
            accounts,
            deployments: Deployments::new(),
            verifier: Box::new(RecordingVerifier::new()),
        })
    }

    pub fn with_verifier(mut self, verifier: Box<dyn SourceVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn address(&self, name: &str) -> Result<Address, DeployError> {
        self.deployments.address(name)
    }

    /// Deploy `contract` from the deployer, wait for confirmations and record
    /// it under `name`. Verification runs afterwards when configured; a
    /// failed verification is logged and leaves the record in place.
    pub fn deploy<C: Contract>(
        &mut self,
        name: &str,
        contract: C,
        args: Vec<String>,
    ) -> Result<Address, DeployError> {
        let deployed = self
            .ledger
            .deploy(self.accounts.deployer, contract)
            .map_err(|source| DeployError::Step {
                step: name.to_string(),
                source,
            })?;
        let address = deployed.address;
        self.wait_confirmations();
        info!(contract = name, address = %address, block = %deployed.receipt.block.number, "deployed");

        self.deployments.insert(DeploymentRecord {
            name: name.to_string(),
            address,
            args: args.clone(),
            block: deployed.receipt.block.number,
        });

        if self.config.should_verify() {
            let request = VerificationRequest {
                name: name.to_string(),
                address,
                args,
                network: self.config.network,
            };
            if let Err(e) = self.verifier.verify(&request) {
                warn!(contract = name, address = %address, error = %e, "source verification failed");
            }
        }
        Ok(address)
    }

    /// Send a transaction from the deployer on behalf of `step`.
    pub fn send(&mut self, step: &str, to: Address, calldata: &[u8]) -> Result<Receipt, DeployError> {
        let receipt = self
            .ledger
            .transact(self.accounts.deployer, to, Amount::ZERO, calldata)
            .map_err(|source| DeployError::Step {
                step: step.to_string(),
                source,
            })?;
        debug!(step, to = %to, block = %receipt.block.number, "transaction mined");
        Ok(receipt)
    }

    /// The deployment transaction counts as the first confirmation.
    fn wait_confirmations(&mut self) {
        let extra = self.config.confirmations().saturating_sub(1);
        if extra > 0 {
            self.ledger.mine(extra);
        }
    }
}
