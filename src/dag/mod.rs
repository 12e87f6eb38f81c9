// src/dag/mod.rs

pub mod graph;

pub use graph::{Dag, all_nodes, reverse_graph, subgraph, topological_order};
