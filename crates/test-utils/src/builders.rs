#![allow(dead_code)]

use std::collections::BTreeSet;

use etlcat::dag::Dag;

/// Builder for dependency graphs to simplify test setup.
pub struct DagBuilder {
    dag: Dag,
}

impl DagBuilder {
    pub fn new() -> Self {
        Self { dag: Dag::new() }
    }

    /// Add a step with the given dependencies (added as leaves if they never
    /// get their own entry).
    pub fn step(mut self, name: &str, deps: &[&str]) -> Self {
        self.dag.insert(
            name.to_string(),
            deps.iter().map(|d| d.to_string()).collect::<BTreeSet<_>>(),
        );
        self
    }

    pub fn build(self) -> Dag {
        self.dag
    }
}

impl Default for DagBuilder {
    fn default() -> Self {
        Self::new()
    }
}
