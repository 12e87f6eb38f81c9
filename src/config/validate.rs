// src/config/validate.rs

//! Upfront validation gate over the full DAG.
//!
//! Runs before planning or execution; every rule here is static and
//! independent of which steps are actually selected to run.

use std::str::FromStr;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::Dag;
use crate::errors::{EtlError, Result};
use crate::step::uri::StepUri;

pub fn validate_dag(dag: &Dag) -> Result<()> {
    ensure_has_steps(dag)?;
    validate_schemes(dag)?;
    validate_private_isolation(dag)?;
    validate_acyclic(dag)?;
    Ok(())
}

fn ensure_has_steps(dag: &Dag) -> Result<()> {
    if dag.is_empty() {
        return Err(EtlError::ConfigError(
            "DAG document must contain at least one entry under [steps]".to_string(),
        ));
    }
    Ok(())
}

/// Every step name and dependency name must parse as a known step kind.
fn validate_schemes(dag: &Dag) -> Result<()> {
    for (name, deps) in dag {
        StepUri::from_str(name)?;
        for dep in deps {
            StepUri::from_str(dep)?;
        }
    }
    Ok(())
}

/// A step outside the private and grapher families must never depend on a
/// private step. A public step depending on private data is a data-leakage
/// class of bug, so this is checked over the whole DAG even for steps not
/// selected in today's run.
fn validate_private_isolation(dag: &Dag) -> Result<()> {
    for (name, deps) in dag {
        let uri = StepUri::from_str(name)?;
        if uri.scheme.is_private() || uri.scheme.is_grapher() {
            continue;
        }
        for dep in deps {
            let dep_uri = StepUri::from_str(dep)?;
            if dep_uri.scheme.is_private() {
                return Err(EtlError::PrivateDependency {
                    step: name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_acyclic(dag: &Dag) -> Result<()> {
    // Edge direction: dependency -> dependent, so a topological sort of this
    // graph is a valid execution order.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in dag.keys() {
        graph.add_node(name.as_str());
    }

    for (name, deps) in dag {
        for dep in deps {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(EtlError::DagCycle(format!(
                "cycle involving step '{}'",
                node
            )))
        }
    }
}
