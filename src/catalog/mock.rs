// src/catalog/mock.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::Catalog;
use crate::errors::{EtlError, Result};
use crate::step::Step;
use crate::step::checksum::checksum_bytes;
use crate::step::uri::StepUri;

#[derive(Debug, Default)]
struct MemoryState {
    /// uri -> (file name -> file contents).
    source_files: HashMap<String, BTreeMap<String, Vec<u8>>>,
    /// uri -> output content seed (hashed for the output checksum).
    outputs: HashMap<String, Vec<u8>>,
    /// uri -> recorded source checksum.
    recorded: HashMap<String, String>,
    /// uris marked private after a run.
    private_marks: HashSet<String>,
    /// Step names in the order they were run.
    run_log: Vec<String>,
    /// Steps whose run_step fails.
    fail_on: HashSet<String>,
}

/// In-memory [`Catalog`] for tests: no filesystem, no network, mutex'd state
/// so the concurrent dirty check can hit it from a worker pool.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file defining the step's own logic.
    pub fn add_source_file(&self, uri: &str, name: &str, contents: impl Into<Vec<u8>>) {
        let mut state = self.state.lock().unwrap();
        state
            .source_files
            .entry(uri.to_string())
            .or_default()
            .insert(name.to_string(), contents.into());
    }

    /// Materialize (or overwrite) a step's output with the given content.
    pub fn set_output(&self, uri: &str, contents: impl Into<Vec<u8>>) {
        let mut state = self.state.lock().unwrap();
        state.outputs.insert(uri.to_string(), contents.into());
    }

    /// Drop a step's output, as if it had never been built.
    pub fn clear_output(&self, uri: &str) {
        let mut state = self.state.lock().unwrap();
        state.outputs.remove(uri);
        state.recorded.remove(uri);
    }

    /// Make run_step fail for the given step.
    pub fn fail_on(&self, uri: &str) {
        let mut state = self.state.lock().unwrap();
        state.fail_on.insert(uri.to_string());
    }

    /// Names of the steps run so far, in execution order.
    pub fn run_log(&self) -> Vec<String> {
        self.state.lock().unwrap().run_log.clone()
    }

    pub fn is_marked_private(&self, uri: &str) -> bool {
        self.state.lock().unwrap().private_marks.contains(uri)
    }
}

impl Catalog for MemoryCatalog {
    fn source_checksums(&self, uri: &StepUri) -> Result<Vec<(String, String)>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .source_files
            .get(&uri.to_string())
            .map(|files| {
                files
                    .iter()
                    .map(|(name, contents)| (name.clone(), checksum_bytes(contents)))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn output_exists(&self, uri: &StepUri) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.outputs.contains_key(&uri.to_string()))
    }

    fn output_checksum(&self, uri: &StepUri) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .outputs
            .get(&uri.to_string())
            .map(|contents| checksum_bytes(contents))
            .ok_or_else(|| {
                EtlError::ConfigError(format!("no output registered for '{}'", uri))
            })
    }

    fn recorded_source_checksum(&self, uri: &StepUri) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.recorded.get(&uri.to_string()).cloned())
    }

    fn record_source_checksum(&self, uri: &StepUri, checksum: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.recorded.insert(uri.to_string(), checksum.to_string());
        Ok(())
    }

    fn mark_output_private(&self, uri: &StepUri) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.private_marks.insert(uri.to_string());
        Ok(())
    }

    fn run_step(&self, step: &Step) -> Result<()> {
        let name = step.uri.to_string();
        let mut state = self.state.lock().unwrap();

        if state.fail_on.contains(&name) {
            return Err(EtlError::StepFailed {
                step: name,
                message: "injected failure".to_string(),
            });
        }

        state.run_log.push(name.clone());
        state
            .outputs
            .insert(name.clone(), format!("built:{name}").into_bytes());
        Ok(())
    }
}
