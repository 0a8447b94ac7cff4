//! The VillageSquare deployment steps.

use tracing::info;
use village_assets::{Fisch, FischCall, Loan, LoanCall, Marketplace};
use village_governance::VillageSquare;
use village_ledger::Contract;
use village_timelock::{LockController, Role, TimelockCall};
use village_token::{CowriesToken, TokenCall};
use village_types::Address;

use crate::env::DeployEnv;
use crate::step::DeployStep;
use crate::DeployError;

pub const COWRIES_TOKEN: &str = "CowriesToken";
pub const LOCK_CONTROLLER: &str = "LockController";
pub const VILLAGE_SQUARE: &str = "VillageSquare";
pub const FISCH: &str = "Fisch";
pub const LOAN: &str = "Loan";
pub const MARKETPLACE: &str = "Marketplace";
pub const SETUP_ROLES: &str = "SetupRoles";

/// Whether the contract recorded as `name` is already owned by the lock
/// controller. A recorded contract still owned by the deployer is only half
/// deployed.
fn owned_by_timelock<C: Contract>(env: &DeployEnv, name: &str, owner: fn(&C) -> Address) -> bool {
    let (Ok(timelock), Ok(address)) = (env.address(LOCK_CONTROLLER), env.address(name)) else {
        return false;
    };
    env.ledger
        .contract::<C>(address)
        .is_ok_and(|contract| owner(contract) == timelock)
}

/// Every step of a full deployment, in registration order.
pub fn all_steps() -> Vec<Box<dyn DeployStep>> {
    vec![
        Box::new(TokenStep),
        Box::new(LockControllerStep),
        Box::new(GovernorStep),
        Box::new(FischStep),
        Box::new(LoanStep),
        Box::new(MarketplaceStep),
        Box::new(SetupRolesStep),
    ]
}

/// Governance token, then delegate the deployer's votes to itself so they
/// count from the next block.
pub struct TokenStep;

impl DeployStep for TokenStep {
    fn name(&self) -> &'static str {
        COWRIES_TOKEN
    }

    fn tags(&self) -> &'static [&'static str] {
        &["all", "villagesquare"]
    }

    fn apply(&self, env: &mut DeployEnv) -> Result<(), DeployError> {
        let supply = env.config.initial_supply_amount();
        let token = CowriesToken::new(env.config.token_name.clone(), env.config.token_symbol.clone(), supply);
        let args = vec![
            env.config.token_name.clone(),
            env.config.token_symbol.clone(),
            supply.to_string(),
        ];
        let address = env.deploy(COWRIES_TOKEN, token, args)?;

        let deployer = env.accounts.deployer;
        let delegate = TokenCall::Delegate { delegatee: deployer };
        env.send(COWRIES_TOKEN, address, &delegate.encode())?;
        let checkpoints = env
            .ledger
            .contract::<CowriesToken>(address)
            .map(|t| t.num_checkpoints(deployer))
            .unwrap_or(0);
        info!(delegatee = %deployer, checkpoints, "delegated");
        Ok(())
    }
}

/// Lock controller with the deployer as temporary admin and no proposers or
/// executors yet.
pub struct LockControllerStep;

impl DeployStep for LockControllerStep {
    fn name(&self) -> &'static str {
        LOCK_CONTROLLER
    }

    fn tags(&self) -> &'static [&'static str] {
        &["all", "villagesquare"]
    }

    fn apply(&self, env: &mut DeployEnv) -> Result<(), DeployError> {
        let deployer = env.accounts.deployer;
        let min_delay = env.config.min_delay;
        let args = vec![
            min_delay.to_string(),
            "[]".to_string(),
            "[]".to_string(),
            deployer.to_string(),
        ];
        env.deploy(
            LOCK_CONTROLLER,
            LockController::new(min_delay, vec![], vec![], Some(deployer)),
            args,
        )?;
        Ok(())
    }
}

pub struct GovernorStep;

impl DeployStep for GovernorStep {
    fn name(&self) -> &'static str {
        VILLAGE_SQUARE
    }

    fn tags(&self) -> &'static [&'static str] {
        &["all", "villagesquare"]
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[COWRIES_TOKEN, LOCK_CONTROLLER]
    }

    fn apply(&self, env: &mut DeployEnv) -> Result<(), DeployError> {
        let token = env.address(COWRIES_TOKEN)?;
        let timelock = env.address(LOCK_CONTROLLER)?;
        let settings = env.config.governor_settings();
        let args = vec![
            token.to_string(),
            timelock.to_string(),
            settings.quorum_percentage.to_string(),
            settings.voting_period.to_string(),
            settings.voting_delay.to_string(),
        ];
        env.deploy(VILLAGE_SQUARE, VillageSquare::new(token, timelock, settings), args)?;
        Ok(())
    }
}

/// Fisch NFT, handed to the lock controller so collateral approval goes
/// through governance.
pub struct FischStep;

impl DeployStep for FischStep {
    fn name(&self) -> &'static str {
        FISCH
    }

    fn tags(&self) -> &'static [&'static str] {
        &["all", "fisch"]
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[LOCK_CONTROLLER]
    }

    fn is_applied(&self, env: &DeployEnv) -> bool {
        owned_by_timelock(env, FISCH, Fisch::owner)
    }

    fn apply(&self, env: &mut DeployEnv) -> Result<(), DeployError> {
        let timelock = env.address(LOCK_CONTROLLER)?;
        let fisch = match env.address(FISCH) {
            Ok(existing) => existing,
            Err(_) => env.deploy(FISCH, Fisch::new(), vec![])?,
        };
        let handover = FischCall::TransferOwnership { new_owner: timelock };
        env.send(FISCH, fisch, &handover.encode())?;
        info!(contract = FISCH, owner = %timelock, "ownership transferred");
        Ok(())
    }
}

pub struct LoanStep;

impl DeployStep for LoanStep {
    fn name(&self) -> &'static str {
        LOAN
    }

    fn tags(&self) -> &'static [&'static str] {
        &["all", "loan"]
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[FISCH, LOCK_CONTROLLER]
    }

    fn is_applied(&self, env: &DeployEnv) -> bool {
        owned_by_timelock(env, LOAN, Loan::owner)
    }

    fn apply(&self, env: &mut DeployEnv) -> Result<(), DeployError> {
        let fisch = env.address(FISCH)?;
        let timelock = env.address(LOCK_CONTROLLER)?;
        let loan = match env.address(LOAN) {
            Ok(existing) => existing,
            Err(_) => env.deploy(LOAN, Loan::new(fisch), vec![fisch.to_string()])?,
        };
        let handover = LoanCall::TransferOwnership { new_owner: timelock };
        env.send(LOAN, loan, &handover.encode())?;
        info!(contract = LOAN, owner = %timelock, "ownership transferred");
        Ok(())
    }
}

pub struct MarketplaceStep;

impl DeployStep for MarketplaceStep {
    fn name(&self) -> &'static str {
        MARKETPLACE
    }

    fn tags(&self) -> &'static [&'static str] {
        &["all", "marketplace"]
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[FISCH]
    }

    fn apply(&self, env: &mut DeployEnv) -> Result<(), DeployError> {
        let fisch = env.address(FISCH)?;
        env.deploy(MARKETPLACE, Marketplace::new(fisch), vec![fisch.to_string()])?;
        Ok(())
    }
}

/// Make the governor the only proposer, open execution to anyone and drop
/// the deployer's admin role. Afterwards the lock controller answers to
/// governance alone.
pub struct SetupRolesStep;

impl SetupRolesStep {
    fn role_calls(governor: Address, deployer: Address) -> [TimelockCall; 3] {
        [
            TimelockCall::GrantRole {
                role: Role::Proposer.id(),
                account: governor,
            },
            TimelockCall::GrantRole {
                role: Role::Executor.id(),
                account: Address::ZERO,
            },
            TimelockCall::RevokeRole {
                role: Role::Admin.id(),
                account: deployer,
            },
        ]
    }
}

impl DeployStep for SetupRolesStep {
    fn name(&self) -> &'static str {
        SETUP_ROLES
    }

    fn tags(&self) -> &'static [&'static str] {
        &["all", "setup"]
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[LOCK_CONTROLLER, VILLAGE_SQUARE]
    }

    fn is_applied(&self, env: &DeployEnv) -> bool {
        let (Ok(timelock), Ok(governor)) = (env.address(LOCK_CONTROLLER), env.address(VILLAGE_SQUARE)) else {
            return false;
        };
        let Ok(controller) = env.ledger.contract::<LockController>(timelock) else {
            return false;
        };
        controller.has_role(&Role::Proposer.id(), &governor)
            && controller.has_role(&Role::Executor.id(), &Address::ZERO)
            && !controller.has_role(&Role::Admin.id(), &env.accounts.deployer)
    }

    fn apply(&self, env: &mut DeployEnv) -> Result<(), DeployError> {
        let timelock = env.address(LOCK_CONTROLLER)?;
        let governor = env.address(VILLAGE_SQUARE)?;
        info!("setting up lock controller roles");
        for call in Self::role_calls(governor, env.accounts.deployer) {
            env.send(SETUP_ROLES, timelock, &call.encode())?;
        }
        Ok(())
    }
}
