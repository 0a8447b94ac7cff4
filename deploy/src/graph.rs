//! Declarative step graph: select by tag, order by dependency, run.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::env::DeployEnv;
use crate::step::DeployStep;
use crate::steps;
use crate::DeployError;

/// What a run did with each planned step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub applied: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
}

#[derive(Default)]
pub struct DeployGraph {
    steps: Vec<Box<dyn DeployStep>>,
}

impl DeployGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full VillageSquare deployment.
    pub fn standard() -> Self {
        Self {
            steps: steps::all_steps(),
        }
    }

    pub fn register(&mut self, step: Box<dyn DeployStep>) -> Result<(), DeployError> {
        if self.find(step.name()).is_some() {
            return Err(DeployError::DuplicateStep(step.name().to_string()));
        }
        self.steps.push(step);
        Ok(())
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn tags(&self) -> BTreeSet<&'static str> {
        self.steps.iter().flat_map(|s| s.tags().iter().copied()).collect()
    }

    fn find(&self, name: &str) -> Option<&dyn DeployStep> {
        self.steps
            .iter()
            .find(|s| s.name() == name)
            .map(|s| &**s)
    }

    /// Steps carrying any of `tags` plus everything they depend on, each
    /// after its dependencies. Ties keep registration order.
    pub fn plan(&self, tags: &[&str]) -> Result<Vec<&'static str>, DeployError> {
        for tag in tags {
            if !self.steps.iter().any(|s| s.tags().iter().any(|t| t == tag)) {
                return Err(DeployError::UnknownTag(tag.to_string()));
            }
        }

        let mut ordered = Vec::new();
        let mut done = BTreeSet::new();
        let mut path = Vec::new();
        for step in &self.steps {
            if step.tags().iter().any(|t| tags.contains(t)) {
                self.visit(&**step, &mut path, &mut done, &mut ordered)?;
            }
        }
        Ok(ordered)
    }

    fn visit(
        &self,
        step: &dyn DeployStep,
        path: &mut Vec<&'static str>,
        done: &mut BTreeSet<&'static str>,
        ordered: &mut Vec<&'static str>,
    ) -> Result<(), DeployError> {
        let name = step.name();
        if done.contains(name) {
            return Ok(());
        }
        if let Some(start) = path.iter().position(|n| *n == name) {
            let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(name.to_string());
            return Err(DeployError::DependencyCycle(cycle));
        }

        path.push(name);
        for dependency in step.dependencies() {
            let dep = self.find(dependency).ok_or_else(|| DeployError::UnknownDependency {
                step: name.to_string(),
                dependency: dependency.to_string(),
            })?;
            self.visit(dep, path, done, ordered)?;
        }
        path.pop();

        done.insert(name);
        ordered.push(name);
        Ok(())
    }

    /// Apply the plan for `tags`, skipping steps already on the ledger.
    pub fn run(&self, env: &mut DeployEnv, tags: &[&str]) -> Result<RunReport, DeployError> {
        let plan = self.plan(tags)?;
        info!(network = %env.config.network, steps = plan.len(), "running deployment plan");

        let mut report = RunReport::default();
        for name in plan {
            let Some(step) = self.find(name) else {
                continue;
            };
            if step.is_applied(env) {
                info!(step = name, "already applied, skipping");
                report.skipped.push(name);
                continue;
            }
            info!(step = name, "applying");
            step.apply(env).inspect_err(|e| warn!(step = name, error = %e, "step failed"))?;
            report.applied.push(name);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeployConfig;
    use crate::steps::*;

    struct Fake {
        name: &'static str,
        tags: &'static [&'static str],
        deps: &'static [&'static str],
    }

    impl DeployStep for Fake {
        fn name(&self) -> &'static str {
            self.name
        }

        fn tags(&self) -> &'static [&'static str] {
            self.tags
        }

        fn dependencies(&self) -> &'static [&'static str] {
            self.deps
        }

        fn is_applied(&self, _env: &DeployEnv) -> bool {
            false
        }

        fn apply(&self, _env: &mut DeployEnv) -> Result<(), DeployError> {
            Ok(())
        }
    }

    fn fake(name: &'static str, deps: &'static [&'static str]) -> Box<dyn DeployStep> {
        Box::new(Fake {
            name,
            tags: &["x"],
            deps,
        })
    }

    #[test]
    fn full_plan_orders_dependencies_first() {
        let plan = DeployGraph::standard().plan(&["all"]).unwrap();
        assert_eq!(
            plan,
            [COWRIES_TOKEN, LOCK_CONTROLLER, VILLAGE_SQUARE, FISCH, LOAN, MARKETPLACE, SETUP_ROLES]
        );
    }

    #[test]
    fn tag_pulls_in_transitive_dependencies() {
        let graph = DeployGraph::standard();
        assert_eq!(graph.plan(&["loan"]).unwrap(), [LOCK_CONTROLLER, FISCH, LOAN]);
        assert_eq!(
            graph.plan(&["setup"]).unwrap(),
            [LOCK_CONTROLLER, COWRIES_TOKEN, VILLAGE_SQUARE, SETUP_ROLES]
        );
        assert_eq!(graph.plan(&["marketplace", "fisch"]).unwrap(), [LOCK_CONTROLLER, FISCH, MARKETPLACE]);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = DeployGraph::standard().plan(&["box"]).unwrap_err();
        assert!(matches!(err, DeployError::UnknownTag(tag) if tag == "box"));
    }

    #[test]
    fn cycle_is_reported_with_its_path() {
        let mut graph = DeployGraph::new();
        graph.register(fake("a", &["b"])).unwrap();
        graph.register(fake("b", &["c"])).unwrap();
        graph.register(fake("c", &["a"])).unwrap();
        match graph.plan(&["x"]).unwrap_err() {
            DeployError::DependencyCycle(path) => assert_eq!(path, ["a", "b", "c", "a"]),
            other => panic!("expected cycle, got {other}"),
        }
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let mut graph = DeployGraph::new();
        graph.register(fake("a", &["ghost"])).unwrap();
        assert!(matches!(
            graph.plan(&["x"]).unwrap_err(),
            DeployError::UnknownDependency { dependency, .. } if dependency == "ghost"
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut graph = DeployGraph::new();
        graph.register(fake("a", &[])).unwrap();
        assert!(matches!(graph.register(fake("a", &[])), Err(DeployError::DuplicateStep(_))));
    }

    #[test]
    fn rerun_skips_applied_steps() {
        let graph = DeployGraph::standard();
        let mut env = DeployEnv::new(DeployConfig::default()).unwrap();
        let first = graph.run(&mut env, &["all"]).unwrap();
        assert_eq!(first.applied.len(), 7);

        let height = env.ledger.block().number;
        let second = graph.run(&mut env, &["all"]).unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.skipped.len(), 7);
        assert_eq!(env.ledger.block().number, height);
    }
}
