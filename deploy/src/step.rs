//! The unit of a deployment plan.

use crate::env::DeployEnv;
use crate::DeployError;

/// One named, tagged deployment action.
///
/// Steps declare the steps they need; the graph orders them. A step whose
/// effect is already on the ledger reports `is_applied` and is skipped, so
/// running a plan twice is harmless.
pub trait DeployStep {
    fn name(&self) -> &'static str;

    fn tags(&self) -> &'static [&'static str];

    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    fn is_applied(&self, env: &DeployEnv) -> bool {
        env.deployments.contains(self.name())
    }

    fn apply(&self, env: &mut DeployEnv) -> Result<(), DeployError>;
}
