//! Shared fixture: a full `all` deployment plus governance helpers.

#![allow(dead_code)]

use village_assets::{DigitalAsset, FischCall};
use village_crypto::hash_text;
use village_deploy::steps::{FISCH, LOAN, LOCK_CONTROLLER, MARKETPLACE, VILLAGE_SQUARE};
use village_deploy::{deploy_all, DeployConfig, DeployEnv};
use village_governance::{proposal_state, GovernorCall, ProposalCreated, ProposalState, VoteType};
use village_ledger::{CallError, Receipt};
use village_types::{Address, Amount, ProposalId};

pub const REASON: &str = "I lika do da cha cha";

pub struct Fixture {
    pub env: DeployEnv,
    pub governor: Address,
    pub timelock: Address,
    pub fisch: Address,
    pub loan: Address,
    pub marketplace: Address,
}

pub fn fixture() -> Fixture {
    let env = deploy_all(DeployConfig::default()).expect("deploy all");
    let address = |name| env.address(name).expect("deployed");
    Fixture {
        governor: address(VILLAGE_SQUARE),
        timelock: address(LOCK_CONTROLLER),
        fisch: address(FISCH),
        loan: address(LOAN),
        marketplace: address(MARKETPLACE),
        env,
    }
}

pub fn gta() -> DigitalAsset {
    DigitalAsset {
        title: "Grand Theft Auto 6".into(),
        description: "Grand theft auto Game rights".into(),
        price: Amount::ether(5),
        asset_uri: "www.grandTheftAuto".into(),
        revenue: Amount::ether(3_000),
        expenses: Amount::ether(4_000),
        traffic: Amount::ether(3_000_000),
        product_link: "www.gta.com".into(),
        owner_email: "gta@gmail.com".into(),
    }
}

impl Fixture {
    pub fn deployer(&self) -> Address {
        self.env.accounts.deployer
    }

    pub fn borrower(&self) -> Address {
        self.env.accounts.borrower
    }

    pub fn liquidator(&self) -> Address {
        self.env.accounts.liquidator
    }

    pub fn send(&mut self, from: Address, to: Address, value: Amount, calldata: &[u8]) -> Result<Receipt, CallError> {
        self.env.ledger.transact(from, to, value, calldata)
    }

    /// Mint a Fisch to `owner` and return its id.
    pub fn mint(&mut self, owner: Address) -> u64 {
        let fisch = self.fisch;
        let receipt = self
            .send(owner, fisch, Amount::ZERO, &FischCall::MintNft(gta()).encode())
            .expect("mint");
        receipt.decode_return::<u64>().expect("token id")
    }

    pub fn state(&self, id: &ProposalId) -> ProposalState {
        proposal_state(&self.env.ledger, self.governor, id).expect("state")
    }

    pub fn voting_delay(&self) -> u64 {
        self.env.config.voting_delay
    }

    pub fn voting_period(&self) -> u64 {
        self.env.config.voting_period
    }

    pub fn min_delay(&self) -> u64 {
        self.env.config.min_delay
    }

    pub fn propose(&mut self, target: Address, calldata: Vec<u8>, description: &str) -> Result<ProposalId, CallError> {
        let (governor, deployer) = (self.governor, self.deployer());
        let call = GovernorCall::Propose {
            targets: vec![target],
            values: vec![Amount::ZERO],
            calldatas: vec![calldata],
            description: description.to_string(),
        };
        let receipt = self.send(deployer, governor, Amount::ZERO, &call.encode())?;
        Ok(receipt
            .event::<ProposalCreated>()
            .expect("ProposalCreated emitted")
            .proposal_id)
    }

    pub fn vote(&mut self, id: ProposalId, support: VoteType) -> Result<(), CallError> {
        let (governor, deployer) = (self.governor, self.deployer());
        let call = GovernorCall::CastVoteWithReason {
            proposal_id: id,
            support,
            reason: REASON.into(),
        };
        self.send(deployer, governor, Amount::ZERO, &call.encode()).map(|_| ())
    }

    pub fn queue(&mut self, target: Address, calldata: Vec<u8>, description: &str) -> Result<(), CallError> {
        let (governor, deployer) = (self.governor, self.deployer());
        let call = GovernorCall::Queue {
            targets: vec![target],
            values: vec![Amount::ZERO],
            calldatas: vec![calldata],
            description_hash: hash_text(description),
        };
        self.send(deployer, governor, Amount::ZERO, &call.encode()).map(|_| ())
    }

    pub fn execute(&mut self, target: Address, calldata: Vec<u8>, description: &str) -> Result<(), CallError> {
        let (governor, deployer) = (self.governor, self.deployer());
        let call = GovernorCall::Execute {
            targets: vec![target],
            values: vec![Amount::ZERO],
            calldatas: vec![calldata],
            description_hash: hash_text(description),
        };
        self.send(deployer, governor, Amount::ZERO, &call.encode()).map(|_| ())
    }

    /// Run one call through propose, vote, queue, delay and execute.
    pub fn govern(&mut self, target: Address, calldata: Vec<u8>, description: &str) -> ProposalId {
        let id = self.propose(target, calldata.clone(), description).expect("propose");
        self.env.ledger.mine(self.voting_delay() + 1);
        self.vote(id, VoteType::For).expect("vote");
        self.env.ledger.mine(self.voting_period() + 1);
        self.queue(target, calldata.clone(), description).expect("queue");
        self.env.ledger.move_time(self.min_delay() + 1);
        self.execute(target, calldata, description).expect("execute");
        id
    }
}
