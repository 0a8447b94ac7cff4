//! The VillageSquare governor contract.

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use village_crypto::hash_text;
use village_ledger::{codec, BlockEnv, CallContext, CallError, Contract, EventData, Ledger};
use village_timelock::{hash_operation_batch, Call, LockController, TimelockCall};
use village_token::CowriesToken;
use village_types::{Address, Amount, BlockNumber, Hash32, OperationId, ProposalId, Timestamp};

use crate::counting::{ProposalVote, VoteType};
use crate::error::GovernorError;
use crate::proposal::{ProposalBatch, ProposalCore, ProposalState};
use crate::settings::GovernorSettings;

// ── Events ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCreated {
    pub proposal_id: ProposalId,
    pub proposer: Address,
    pub calls: Vec<Call>,
    pub snapshot: BlockNumber,
    pub deadline: BlockNumber,
    pub description: String,
}

impl EventData for ProposalCreated {
    const NAME: &'static str = "ProposalCreated";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCast {
    pub voter: Address,
    pub proposal_id: ProposalId,
    pub support: VoteType,
    pub weight: Amount,
    pub reason: String,
}

impl EventData for VoteCast {
    const NAME: &'static str = "VoteCast";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalQueued {
    pub proposal_id: ProposalId,
    pub eta: Timestamp,
}

impl EventData for ProposalQueued {
    const NAME: &'static str = "ProposalQueued";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalExecuted {
    pub proposal_id: ProposalId,
}

impl EventData for ProposalExecuted {
    const NAME: &'static str = "ProposalExecuted";
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCanceled {
    pub proposal_id: ProposalId,
}

impl EventData for ProposalCanceled {
    const NAME: &'static str = "ProposalCanceled";
}

// ── Calldata ───────────────────────────────────────────────────────────

/// Calldata accepted by [`VillageSquare`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GovernorCall {
    Propose {
        targets: Vec<Address>,
        values: Vec<Amount>,
        calldatas: Vec<Vec<u8>>,
        description: String,
    },
    CastVote {
        proposal_id: ProposalId,
        support: VoteType,
    },
    CastVoteWithReason {
        proposal_id: ProposalId,
        support: VoteType,
        reason: String,
    },
    Queue {
        targets: Vec<Address>,
        values: Vec<Amount>,
        calldatas: Vec<Vec<u8>>,
        description_hash: Hash32,
    },
    Execute {
        targets: Vec<Address>,
        values: Vec<Amount>,
        calldatas: Vec<Vec<u8>>,
        description_hash: Hash32,
    },
    Cancel {
        targets: Vec<Address>,
        values: Vec<Amount>,
        calldatas: Vec<Vec<u8>>,
        description_hash: Hash32,
    },
}

impl GovernorCall {
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }
}

// ── Contract ───────────────────────────────────────────────────────────

/// Governor with snapshot voting and timelocked execution.
#[derive(Clone, Debug)]
pub struct VillageSquare {
    token: Address,
    timelock: Address,
    settings: GovernorSettings,
    proposals: BTreeMap<ProposalId, ProposalCore>,
    votes: BTreeMap<ProposalId, ProposalVote>,
    operations: BTreeMap<ProposalId, OperationId>,
}

impl VillageSquare {
    pub fn new(token: Address, timelock: Address, settings: GovernorSettings) -> Self {
        Self {
            token,
            timelock,
            settings,
            proposals: BTreeMap::new(),
            votes: BTreeMap::new(),
            operations: BTreeMap::new(),
        }
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn timelock(&self) -> Address {
        self.timelock
    }

    pub fn settings(&self) -> &GovernorSettings {
        &self.settings
    }

    pub fn voting_delay(&self) -> u64 {
        self.settings.voting_delay
    }

    pub fn voting_period(&self) -> u64 {
        self.settings.voting_period
    }

    pub fn proposal_threshold(&self) -> Amount {
        self.settings.proposal_threshold
    }

    pub fn proposal(&self, id: &ProposalId) -> Option<&ProposalCore> {
        self.proposals.get(id)
    }

    pub fn proposal_snapshot(&self, id: &ProposalId) -> Option<BlockNumber> {
        self.proposal(id).map(|p| p.snapshot)
    }

    pub fn proposal_deadline(&self, id: &ProposalId) -> Option<BlockNumber> {
        self.proposal(id).map(|p| p.deadline)
    }

    pub fn proposal_proposer(&self, id: &ProposalId) -> Option<Address> {
        self.proposal(id).map(|p| p.proposer)
    }

    pub fn proposal_eta(&self, id: &ProposalId) -> Option<Timestamp> {
        self.proposal(id).and_then(|p| p.eta)
    }

    /// Timelock operation id of a queued proposal.
    pub fn proposal_operation(&self, id: &ProposalId) -> Option<OperationId> {
        self.operations.get(id).copied()
    }

    /// Tallies as `(against, for, abstain)`.
    pub fn proposal_votes(&self, id: &ProposalId) -> (Amount, Amount, Amount) {
        self.votes
            .get(id)
            .map(|v| (v.against_votes, v.for_votes, v.abstain_votes))
            .unwrap_or_default()
    }

    pub fn has_voted(&self, id: &ProposalId, voter: &Address) -> bool {
        self.votes.get(id).is_some_and(|v| v.has_voted(voter))
    }

    /// Votes needed at `block`: a share of total supply at that block.
    pub fn quorum(
        &self,
        token: &CowriesToken,
        block: BlockNumber,
        current: BlockNumber,
    ) -> Result<Amount, GovernorError> {
        let supply = token.get_past_total_supply(block, current)?;
        Ok(supply
            .mul_div(self.settings.quorum_percentage, 100)
            .unwrap_or(Amount::new(u128::MAX)))
    }

    /// State of a proposal as seen in `block`.
    pub fn state(
        &self,
        id: &ProposalId,
        token: &CowriesToken,
        block: BlockEnv,
    ) -> Result<ProposalState, GovernorError> {
        let p = self
            .proposals
            .get(id)
            .ok_or(GovernorError::UnknownProposal(*id))?;

        if p.executed {
            return Ok(ProposalState::Executed);
        }
        if p.canceled {
            return Ok(ProposalState::Canceled);
        }
        if block.number < p.snapshot {
            return Ok(ProposalState::Pending);
        }
        if block.number <= p.deadline {
            return Ok(ProposalState::Active);
        }
        if let Some(eta) = p.eta {
            if eta.has_expired(self.settings.queue_grace_period_secs, block.timestamp) {
                return Ok(ProposalState::Expired);
            }
            return Ok(ProposalState::Queued);
        }

        let votes = self.votes.get(id).cloned().unwrap_or_default();
        let quorum = self.quorum(token, p.snapshot, block.number)?;
        if votes.quorum_reached(quorum) && votes.vote_succeeded() {
            if block.number > p.deadline.plus(self.settings.grace_period_blocks) {
                return Ok(ProposalState::Expired);
            }
            return Ok(ProposalState::Succeeded);
        }
        Ok(ProposalState::Defeated)
    }

    fn state_in(&self, ctx: &CallContext<'_>, id: &ProposalId) -> Result<ProposalState, CallError> {
        let token = ctx.view::<CowriesToken>(self.token)?;
        Ok(self.state(id, token, ctx.block())?)
    }

    fn propose(
        &mut self,
        ctx: &mut CallContext<'_>,
        batch: ProposalBatch,
        description: String,
    ) -> Result<ProposalId, CallError> {
        let proposer = ctx.sender();
        let description_hash = hash_text(&description);
        let id = batch.id(&description_hash);
        if self.proposals.contains_key(&id) {
            return Err(GovernorError::DuplicateProposal(id).into());
        }

        let current = ctx.block().number;
        let threshold = self.settings.proposal_threshold;
        if !threshold.is_zero() {
            let token = ctx.view::<CowriesToken>(self.token)?;
            let votes = token
                .get_past_votes(proposer, current.minus(1), current)
                .map_err(GovernorError::from)?;
            if votes < threshold {
                return Err(GovernorError::InsufficientProposerVotes { votes, threshold }.into());
            }
        }

        let snapshot = current.plus(self.settings.voting_delay);
        let deadline = snapshot.plus(self.settings.voting_period);
        ctx.emit(&ProposalCreated {
            proposal_id: id,
            proposer,
            calls: batch.calls(),
            snapshot,
            deadline,
            description,
        });
        self.proposals.insert(
            id,
            ProposalCore {
                proposer,
                batch,
                description_hash,
                snapshot,
                deadline,
                eta: None,
                canceled: false,
                executed: false,
            },
        );
        info!(proposal = %id, %proposer, %snapshot, %deadline, "proposal created");
        Ok(id)
    }

    fn cast_vote(
        &mut self,
        ctx: &mut CallContext<'_>,
        id: ProposalId,
        support: VoteType,
        reason: String,
    ) -> Result<Amount, CallError> {
        let voter = ctx.sender();
        let state = self.state_in(ctx, &id)?;
        if state != ProposalState::Active {
            return Err(GovernorError::ProposalNotActive { id, state }.into());
        }
        if self.has_voted(&id, &voter) {
            return Err(GovernorError::AlreadyVoted { voter, id }.into());
        }

        let snapshot = self
            .proposal_snapshot(&id)
            .ok_or(GovernorError::UnknownProposal(id))?;
        let weight = ctx
            .view::<CowriesToken>(self.token)?
            .get_past_votes(voter, snapshot, ctx.block().number)
            .map_err(GovernorError::from)?;
        self.votes.entry(id).or_default().count(voter, support, weight);
        debug!(proposal = %id, %voter, ?support, %weight, "vote cast");
        ctx.emit(&VoteCast {
            voter,
            proposal_id: id,
            support,
            weight,
            reason,
        });
        Ok(weight)
    }

    fn salt(&self, ctx: &CallContext<'_>, description_hash: &Hash32) -> Hash32 {
        description_hash.xor(&ctx.this().to_word())
    }

    fn queue(
        &mut self,
        ctx: &mut CallContext<'_>,
        batch: ProposalBatch,
        description_hash: Hash32,
    ) -> Result<ProposalId, CallError> {
        let id = batch.id(&description_hash);
        let state = self.state_in(ctx, &id)?;
        if state != ProposalState::Succeeded {
            return Err(GovernorError::ProposalNotSucceeded { id, state }.into());
        }

        let delay = ctx.view::<LockController>(self.timelock)?.get_min_delay();
        let calls = batch.calls();
        let salt = self.salt(ctx, &description_hash);
        let operation = hash_operation_batch(&calls, &Hash32::ZERO, &salt);
        let schedule = TimelockCall::ScheduleBatch {
            calls,
            predecessor: Hash32::ZERO,
            salt,
            delay,
        };
        ctx.call(self.timelock, Amount::ZERO, &schedule.encode())?;

        let eta = ctx.block().timestamp.plus_secs(delay);
        if let Some(p) = self.proposals.get_mut(&id) {
            p.eta = Some(eta);
        }
        self.operations.insert(id, operation);
        info!(proposal = %id, %operation, %eta, "proposal queued");
        ctx.emit(&ProposalQueued {
            proposal_id: id,
            eta,
        });
        Ok(id)
    }

    fn execute(
        &mut self,
        ctx: &mut CallContext<'_>,
        batch: ProposalBatch,
        description_hash: Hash32,
    ) -> Result<ProposalId, CallError> {
        let id = batch.id(&description_hash);
        let state = self.state_in(ctx, &id)?;
        match state {
            ProposalState::Queued => {}
            ProposalState::Executed => return Err(GovernorError::AlreadyExecuted(id).into()),
            _ => return Err(GovernorError::ProposalNotQueued { id, state }.into()),
        }
        let now = ctx.block().timestamp;
        let eta = self.proposal_eta(&id).unwrap_or(now);
        if now < eta {
            return Err(GovernorError::TimelockNotReady { id, eta, now }.into());
        }

        if let Some(p) = self.proposals.get_mut(&id) {
            p.executed = true;
        }
        let run = TimelockCall::ExecuteBatch {
            calls: batch.calls(),
            predecessor: Hash32::ZERO,
            salt: self.salt(ctx, &description_hash),
        };
        let value = ctx.value();
        ctx.call(self.timelock, value, &run.encode())?;

        info!(proposal = %id, "proposal executed");
        ctx.emit(&ProposalExecuted { proposal_id: id });
        Ok(id)
    }

    fn cancel(
        &mut self,
        ctx: &mut CallContext<'_>,
        batch: ProposalBatch,
        description_hash: Hash32,
    ) -> Result<ProposalId, CallError> {
        let id = batch.id(&description_hash);
        let state = self.state_in(ctx, &id)?;
        if self.proposal_proposer(&id) != Some(ctx.sender()) {
            return Err(GovernorError::NotProposer.into());
        }
        if !matches!(state, ProposalState::Pending | ProposalState::Active) {
            return Err(GovernorError::ProposalNotCancellable { id, state }.into());
        }
        if let Some(p) = self.proposals.get_mut(&id) {
            p.canceled = true;
        }
        info!(proposal = %id, "proposal canceled");
        ctx.emit(&ProposalCanceled { proposal_id: id });
        Ok(id)
    }
}

impl Contract for VillageSquare {
    fn name(&self) -> &'static str {
        "VillageSquare"
    }

    fn deployed(&mut self, _ctx: &mut CallContext<'_>) -> Result<(), CallError> {
        self.settings.validate()?;
        Ok(())
    }

    fn handle(&mut self, ctx: &mut CallContext<'_>, calldata: &[u8]) -> Result<Vec<u8>, CallError> {
        let call = codec::decode::<GovernorCall>(calldata)?;
        if !matches!(call, GovernorCall::Execute { .. }) {
            ctx.require_no_value()?;
        }
        match call {
            GovernorCall::Propose {
                targets,
                values,
                calldatas,
                description,
            } => {
                let batch = ProposalBatch::new(targets, values, calldatas)?;
                let id = self.propose(ctx, batch, description)?;
                Ok(codec::encode(&id))
            }
            GovernorCall::CastVote {
                proposal_id,
                support,
            } => {
                let weight = self.cast_vote(ctx, proposal_id, support, String::new())?;
                Ok(codec::encode(&weight))
            }
            GovernorCall::CastVoteWithReason {
                proposal_id,
                support,
                reason,
            } => {
                let weight = self.cast_vote(ctx, proposal_id, support, reason)?;
                Ok(codec::encode(&weight))
            }
            GovernorCall::Queue {
                targets,
                values,
                calldatas,
                description_hash,
            } => {
                let batch = ProposalBatch::new(targets, values, calldatas)?;
                Ok(codec::encode(&self.queue(ctx, batch, description_hash)?))
            }
            GovernorCall::Execute {
                targets,
                values,
                calldatas,
                description_hash,
            } => {
                let batch = ProposalBatch::new(targets, values, calldatas)?;
                Ok(codec::encode(&self.execute(ctx, batch, description_hash)?))
            }
            GovernorCall::Cancel {
                targets,
                values,
                calldatas,
                description_hash,
            } => {
                let batch = ProposalBatch::new(targets, values, calldatas)?;
                Ok(codec::encode(&self.cancel(ctx, batch, description_hash)?))
            }
        }
    }

    fn clone_box(&self) -> Box<dyn Contract> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// State of proposal `id` on `governor` as of the latest mined block.
pub fn proposal_state(
    ledger: &Ledger,
    governor: Address,
    id: &ProposalId,
) -> Result<ProposalState, CallError> {
    let gov = ledger.contract::<VillageSquare>(governor)?;
    let token = ledger.contract::<CowriesToken>(gov.token())?;
    Ok(gov.state(id, token, ledger.block())?)
}
