// src/dag/graph.rs

//! Pure graph algorithms over the declarative dependency graph.
//!
//! The graph maps each step name to the set of step names it depends on.
//! BTree containers keep iteration deterministic, which both the topological
//! tie-break and the downstream narrowing rely on.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use regex::Regex;

use crate::errors::{EtlError, Result};

/// Step name -> set of dependency step names.
pub type Dag = BTreeMap<String, BTreeSet<String>>;

/// Every node appearing in the graph, whether as a key or only as a
/// dependency of some other node.
pub fn all_nodes(graph: &Dag) -> BTreeSet<String> {
    let mut nodes: BTreeSet<String> = graph.keys().cloned().collect();
    for deps in graph.values() {
        nodes.extend(deps.iter().cloned());
    }
    nodes
}

/// Flip every edge `parent -> dependency` into `dependency -> parent`.
///
/// Nodes that appear only as dependencies in the input become keys with an
/// empty set in the output, so leaves are never silently dropped.
pub fn reverse_graph(graph: &Dag) -> Dag {
    let mut reversed: Dag = Dag::new();
    for node in all_nodes(graph) {
        reversed.entry(node).or_default();
    }
    for (parent, deps) in graph {
        for dep in deps {
            reversed
                .entry(dep.clone())
                .or_default()
                .insert(parent.clone());
        }
    }
    reversed
}

/// Restrict the graph to the steps matched by `patterns` plus their full
/// ancestor closure; with `downstream`, additionally walk the reversed graph
/// outward from the matches.
///
/// Matching is regex *search* against every node name, not exact match.
///
/// Downstream expansion is a narrowing heuristic: each newly discovered
/// dependent keeps only the single edge back to the node through which it was
/// first reached, rather than its full dependency set. Discovery order is
/// deterministic (BTree adjacency, FIFO queue), so diamonds resolve to the
/// lexically first intermediate parent.
pub fn subgraph(graph: &Dag, patterns: &[Regex], downstream: bool) -> Dag {
    let matched: BTreeSet<String> = all_nodes(graph)
        .into_iter()
        .filter(|name| patterns.iter().any(|p| p.is_match(name)))
        .collect();

    // Ancestors: everything that (indirectly) feeds a matched step.
    let mut included = matched.clone();
    let mut stack: Vec<String> = matched.iter().cloned().collect();
    while let Some(current) = stack.pop() {
        if let Some(deps) = graph.get(&current) {
            for dep in deps {
                if included.insert(dep.clone()) {
                    stack.push(dep.clone());
                }
            }
        }
    }

    let mut result: Dag = included
        .iter()
        .map(|name| (name.clone(), graph.get(name).cloned().unwrap_or_default()))
        .collect();

    if downstream {
        let reversed = reverse_graph(graph);
        let mut seen = included;
        let mut queue: VecDeque<String> = matched.iter().cloned().collect();

        while let Some(current) = queue.pop_front() {
            if let Some(dependents) = reversed.get(&current) {
                for dependent in dependents {
                    if seen.insert(dependent.clone()) {
                        // Keep a single downstream edge; other dependencies of
                        // this dependent are deliberately ignored.
                        result
                            .entry(dependent.clone())
                            .or_default()
                            .insert(current.clone());
                        queue.push_back(dependent.clone());
                    }
                }
            }
        }
    }

    result
}

/// Order the graph so that every dependency precedes its dependents.
///
/// Kahn's algorithm with a lexicographically ordered ready set, so identical
/// inputs always produce identical orders. Fails with [`EtlError::DagCycle`]
/// if any node cannot be scheduled.
pub fn topological_order(graph: &Dag) -> Result<Vec<String>> {
    let nodes = all_nodes(graph);
    let reversed = reverse_graph(graph);

    let mut remaining_deps: BTreeMap<&str, usize> = nodes
        .iter()
        .map(|n| {
            let count = graph
                .get(n)
                .map(|deps| deps.iter().filter(|d| nodes.contains(*d)).count())
                .unwrap_or(0);
            (n.as_str(), count)
        })
        .collect();

    let mut ready: BTreeSet<&str> = remaining_deps
        .iter()
        .filter(|&(_, &count)| count == 0)
        .map(|(&name, _)| name)
        .collect();

    let mut order: Vec<String> = Vec::with_capacity(nodes.len());
    loop {
        let Some(name) = ready.iter().next().copied() else {
            break;
        };
        ready.remove(name);
        order.push(name.to_string());

        if let Some(dependents) = reversed.get(name) {
            for dependent in dependents {
                if let Some(count) = remaining_deps.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent.as_str());
                    }
                }
            }
        }
    }

    if order.len() != nodes.len() {
        let stuck: Vec<&str> = remaining_deps
            .iter()
            .filter(|&(_, &count)| count > 0)
            .map(|(&name, _)| name)
            .collect();
        return Err(EtlError::DagCycle(stuck.join(", ")));
    }

    Ok(order)
}
