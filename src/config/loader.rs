// src/config/loader.rs

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::DagFile;
use crate::dag::Dag;
use crate::errors::Result;

/// Load the root DAG document at `path`, merging its include chain.
///
/// Merge semantics (override, never union):
/// - includes are loaded depth-first in listed order, each overwriting
///   colliding entries from earlier includes (last-listed-wins);
/// - a document's own `steps` merge last, so the root document always wins
///   over anything it includes.
pub fn load_dag(path: impl AsRef<Path>) -> Result<Dag> {
    let path = path.as_ref();
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    load_dag_inner(path, base_dir)
}

fn load_dag_inner(path: &Path, base_dir: &Path) -> Result<Dag> {
    let contents = fs::read_to_string(path)?;
    let file: DagFile = toml::from_str(&contents)?;

    debug!(
        path = ?path,
        steps = file.steps.len(),
        includes = file.include.len(),
        "loaded DAG document"
    );

    let mut merged = Dag::new();
    for include in &file.include {
        let sub = load_dag_inner(&base_dir.join(include), base_dir)?;
        merged = merge_graphs(merged, sub);
    }

    let own: Dag = file
        .steps
        .into_iter()
        .map(|(name, deps)| (name, deps.into_iter().collect::<BTreeSet<_>>()))
        .collect();

    Ok(merge_graphs(merged, own))
}

/// Merge two graphs; for colliding step names the overlay's dependency set
/// replaces the base's entirely.
pub fn merge_graphs(base: Dag, overlay: Dag) -> Dag {
    let mut merged = base;
    for (name, deps) in overlay {
        merged.insert(name, deps);
    }
    merged
}
