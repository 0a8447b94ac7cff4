//! Deployment orchestration for the VillageSquare DAO.
//!
//! A [`DeployGraph`] holds named, tagged [`DeployStep`]s with declared
//! dependencies. Running it for a set of tags deploys the selected contracts
//! and everything they need, in dependency order, against a [`DeployEnv`]:
//! the ledger, the named accounts and the [`Deployments`] registry that later
//! steps (and tests) look contracts up in by name.

pub mod config;
pub mod env;
pub mod error;
pub mod graph;
pub mod registry;
pub mod step;
pub mod steps;
pub mod verify;

pub use config::DeployConfig;
pub use env::{DeployEnv, NamedAccounts};
pub use error::DeployError;
pub use graph::{DeployGraph, RunReport};
pub use registry::{DeploymentRecord, Deployments};
pub use step::DeployStep;
pub use verify::{RecordingVerifier, SourceVerifier, VerificationRequest};

/// Deploy everything tagged `all` on a fresh ledger, like a test fixture.
pub fn deploy_all(config: DeployConfig) -> Result<DeployEnv, DeployError> {
    let mut env = DeployEnv::new(config)?;
    DeployGraph::standard().run(&mut env, &["all"])?;
    Ok(env)
}
