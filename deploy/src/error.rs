use thiserror::Error;
use village_ledger::CallError;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no deployment named {0}")]
    UnknownDeployment(String),

    #[error("no step is tagged {0}")]
    UnknownTag(String),

    #[error("step {step} depends on unknown step {dependency}")]
    UnknownDependency { step: String, dependency: String },

    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    #[error("step {0} is registered twice")]
    DuplicateStep(String),

    #[error("step {step} failed: {source}")]
    Step {
        step: String,
        #[source]
        source: CallError,
    },

    #[error("source verification of {name} failed: {reason}")]
    Verification { name: String, reason: String },
}
