// src/plan/mod.rs

//! Build planning: turn the DAG plus the user's selection into an ordered
//! list of concrete steps.

pub mod dirty;

use std::collections::BTreeSet;

use regex::Regex;
use tracing::debug;

use crate::dag::{Dag, all_nodes, subgraph, topological_order};
use crate::errors::{EtlError, Result};
use crate::step::Step;

pub use dirty::select_dirty_steps;

/// Compute the ordered list of steps to consider for execution.
///
/// - empty `includes` selects the whole DAG;
/// - `only` restricts to exactly the matched names (edges among them kept for
///   ordering) and takes precedence over `downstream`;
/// - otherwise the matched names plus their ancestor closure, and with
///   `downstream` also their transitive dependents;
/// - `excludes` drop names from the final list *after* topological ordering,
///   without reconnecting edges;
/// - steps are instantiated against the full DAG, so an excluded dependency
///   is still resolved inside its parents for checksum purposes.
pub fn compile_steps(
    dag: &Dag,
    includes: &[String],
    excludes: &[String],
    downstream: bool,
    only: bool,
) -> Result<Vec<Step>> {
    let include_patterns = compile_patterns(includes)?;
    let exclude_patterns = compile_patterns(excludes)?;

    let selected: Dag = if includes.is_empty() {
        dag.clone()
    } else if only {
        only_subgraph(dag, &include_patterns)
    } else {
        subgraph(dag, &include_patterns, downstream)
    };

    let order = topological_order(&selected)?;
    debug!(selected = order.len(), "selection ordered");

    let names: Vec<String> = order
        .into_iter()
        .filter(|name| !exclude_patterns.iter().any(|p| p.is_match(name)))
        .collect();

    if names.is_empty() && !includes.is_empty() {
        return Err(EtlError::NoStepsMatched(includes.join(", ")));
    }

    names.iter().map(|name| Step::from_dag(name, dag)).collect()
}

/// Exactly the matched nodes, no transitive expansion in either direction.
fn only_subgraph(dag: &Dag, patterns: &[Regex]) -> Dag {
    let matched: BTreeSet<String> = all_nodes(dag)
        .into_iter()
        .filter(|name| patterns.iter().any(|p| p.is_match(name)))
        .collect();

    matched
        .iter()
        .map(|name| {
            let deps = dag
                .get(name)
                .map(|deps| deps.intersection(&matched).cloned().collect())
                .unwrap_or_default();
            (name.clone(), deps)
        })
        .collect()
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(EtlError::from))
        .collect()
}
