// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// One DAG document as read from a TOML file.
///
/// ```toml
/// include = ["archive.toml"]
///
/// [steps]
/// "data://garden/who/2023-01-01/gho" = ["snapshot://who/2023-01-01/gho.csv"]
/// "snapshot://who/2023-01-01/gho.csv" = []
/// ```
///
/// Step names are URIs (`scheme://path`); values list the names of the steps
/// each step depends on. Include paths are resolved relative to the directory
/// of the root document.
#[derive(Debug, Clone, Deserialize)]
pub struct DagFile {
    /// Step name -> dependency names. A missing list means no dependencies.
    #[serde(default)]
    pub steps: BTreeMap<String, Vec<String>>,

    /// Further documents to merge in before this one's own `steps`.
    #[serde(default)]
    pub include: Vec<String>,
}
