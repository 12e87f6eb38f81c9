mod common;

use std::collections::BTreeSet;

use proptest::prelude::*;
use regex::Regex;

use etlcat::dag::{Dag, reverse_graph, subgraph, topological_order};
use etlcat::errors::EtlError;
use etlcat_test_utils::builders::DagBuilder;

fn patterns(pats: &[&str]) -> Vec<Regex> {
    pats.iter().map(|p| Regex::new(p).unwrap()).collect()
}

#[test]
fn reverse_is_an_involution() {
    common::init();
    let dag = DagBuilder::new()
        .step("a", &["b", "c"])
        .step("b", &["c"])
        .build();

    let back = reverse_graph(&reverse_graph(&dag));

    // "c" only appeared as a value in the input; after two reversals it is a
    // key with an empty set, but the edge sets are identical.
    assert_eq!(back.get("a").unwrap(), dag.get("a").unwrap());
    assert_eq!(back.get("b").unwrap(), dag.get("b").unwrap());
    assert_eq!(back.get("c").unwrap(), &BTreeSet::new());
}

#[test]
fn reverse_flips_edges_and_keeps_leaves() {
    common::init();
    let dag = DagBuilder::new().step("a", &["b"]).build();

    let reversed = reverse_graph(&dag);
    assert!(reversed.get("b").unwrap().contains("a"));
    assert_eq!(reversed.get("a").unwrap(), &BTreeSet::new());
}

#[test]
fn topological_order_respects_edges() {
    common::init();
    let dag = DagBuilder::new()
        .step("a", &["b", "c"])
        .step("b", &["c"])
        .step("d", &["a"])
        .build();

    let order = topological_order(&dag).unwrap();
    let index = |name: &str| order.iter().position(|n| n == name).unwrap();

    assert!(index("c") < index("b"));
    assert!(index("b") < index("a"));
    assert!(index("c") < index("a"));
    assert!(index("a") < index("d"));
}

#[test]
fn topological_order_is_deterministic_with_lexical_ties() {
    common::init();
    // No edges at all: order must fall back to name order.
    let dag = DagBuilder::new()
        .step("c", &[])
        .step("a", &[])
        .step("b", &[])
        .build();

    let order = topological_order(&dag).unwrap();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[test]
fn cycle_is_detected() {
    common::init();
    let dag = DagBuilder::new().step("a", &["b"]).step("b", &["a"]).build();

    assert!(matches!(
        topological_order(&dag),
        Err(EtlError::DagCycle(_))
    ));
}

#[test]
fn selection_includes_ancestors_only_by_default() {
    common::init();
    let dag = DagBuilder::new().step("a", &["b", "c"]).step("b", &["c"]).build();

    let selected = subgraph(&dag, &patterns(&["^b$"]), false);

    assert_eq!(
        selected.keys().cloned().collect::<Vec<_>>(),
        vec!["b", "c"]
    );
    assert!(selected.get("b").unwrap().contains("c"));
    assert!(selected.get("c").unwrap().is_empty());
}

#[test]
fn downstream_selection_reaches_dependents() {
    common::init();
    let dag = DagBuilder::new().step("a", &["b", "c"]).step("b", &["c"]).build();

    let selected = subgraph(&dag, &patterns(&["^b$"]), true);

    assert!(selected.contains_key("a"));
    // The downstream node keeps only the edge it was discovered through.
    assert_eq!(
        selected.get("a").unwrap(),
        &["b".to_string()].into_iter().collect::<BTreeSet<_>>()
    );
}

#[test]
fn downstream_diamond_keeps_a_single_edge() {
    common::init();
    // d depends on both b and c, which both depend on a.
    let dag = DagBuilder::new()
        .step("b", &["a"])
        .step("c", &["a"])
        .step("d", &["b", "c"])
        .build();

    let selected = subgraph(&dag, &patterns(&["^a$"]), true);

    assert!(selected.contains_key("d"));
    // Discovery is deterministic: "b" sorts before "c" and the BFS reaches
    // "d" through it first.
    assert_eq!(
        selected.get("d").unwrap(),
        &["b".to_string()].into_iter().collect::<BTreeSet<_>>()
    );
}

#[test]
fn patterns_match_by_search_not_exact() {
    common::init();
    let dag = DagBuilder::new()
        .step("data://garden/who/2023/gho", &["snapshot://who/2023/gho.csv"])
        .build();

    let selected = subgraph(&dag, &patterns(&["who/2023"]), false);
    assert_eq!(selected.len(), 2);
}

// Strategy: node i may only depend on nodes with a smaller index, so the
// generated graph is always acyclic.
fn acyclic_dag_strategy(max_nodes: usize) -> impl Strategy<Value = Dag> {
    (2..=max_nodes).prop_flat_map(|n| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..n), n).prop_map(
            move |raw| {
                let mut dag = Dag::new();
                for (i, picks) in raw.into_iter().enumerate() {
                    let deps: BTreeSet<String> = picks
                        .into_iter()
                        .filter(|_| i > 0)
                        .map(|p| format!("node_{}", p % i))
                        .collect();
                    dag.insert(format!("node_{i}"), deps);
                }
                dag
            },
        )
    })
}

proptest! {
    #[test]
    fn topological_order_is_valid_for_any_acyclic_dag(dag in acyclic_dag_strategy(12)) {
        let order = topological_order(&dag).unwrap();
        prop_assert_eq!(order.len(), dag.len());

        for (name, deps) in &dag {
            let pos = order.iter().position(|n| n == name).unwrap();
            for dep in deps {
                let dep_pos = order.iter().position(|n| n == dep).unwrap();
                prop_assert!(dep_pos < pos, "{} must precede {}", dep, name);
            }
        }
    }

    #[test]
    fn reverse_involution_preserves_edge_sets(dag in acyclic_dag_strategy(10)) {
        let back = reverse_graph(&reverse_graph(&dag));
        for (name, deps) in &dag {
            prop_assert_eq!(back.get(name).unwrap(), deps);
        }
    }
}
