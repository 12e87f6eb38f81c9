// src/step/mod.rs

//! Polymorphic step model: URI parsing, the recursive factory, checksum
//! propagation and per-kind dirty rules.

pub mod checksum;
pub mod uri;

use std::str::FromStr;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::dag::Dag;
use crate::errors::Result;
use crate::step::checksum::checksum_pairs;
use crate::step::uri::{Scheme, StepUri};

/// The `data://` path that instantiates as a [`StepKind::Reference`] step: it
/// never executes and is never dirty, but its output checksum still flows
/// into everything that depends on it.
pub const REFERENCE_PATH: &str = "garden/reference";

/// Behavioral variant of a step. Privacy is carried separately in
/// [`Step::is_public`] rather than as distinct variants.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepKind {
    Data,
    Reference,
    Snapshot,
    Walden,
    Github,
    Etag,
    Grapher,
    Backport,
}

/// One executable unit of the pipeline with its owned dependency tree.
///
/// Built fresh for every compile; a step occurring as a dependency of two
/// parents is instantiated twice, so no instance is ever shared between
/// pipeline positions.
#[derive(Debug, Clone)]
pub struct Step {
    pub uri: StepUri,
    pub kind: StepKind,
    pub is_public: bool,
    pub dependencies: Vec<Step>,
}

impl Step {
    /// Resolve `name` against the DAG into a concrete step, recursively
    /// constructing all declared dependencies first (pre-order depth-first).
    ///
    /// Names absent from the DAG are leaves with no dependencies. No cycle
    /// detection happens here; a cyclic DAG fails at the topological-sort
    /// stage instead.
    pub fn from_dag(name: &str, dag: &Dag) -> Result<Step> {
        let uri = StepUri::from_str(name)?;

        let kind = match uri.scheme {
            Scheme::Data | Scheme::DataPrivate if uri.path == REFERENCE_PATH => {
                StepKind::Reference
            }
            Scheme::Data | Scheme::DataPrivate => StepKind::Data,
            Scheme::Snapshot | Scheme::SnapshotPrivate => StepKind::Snapshot,
            Scheme::Walden | Scheme::WaldenPrivate => StepKind::Walden,
            Scheme::Github => StepKind::Github,
            Scheme::Etag => StepKind::Etag,
            Scheme::Grapher | Scheme::GrapherPrivate => StepKind::Grapher,
            Scheme::Backport | Scheme::BackportPrivate => StepKind::Backport,
        };

        let dependencies = dag
            .get(name)
            .map(|deps| {
                deps.iter()
                    .map(|dep| Step::from_dag(dep, dag))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Step {
            is_public: !uri.scheme.is_private(),
            uri,
            kind,
            dependencies,
        })
    }

    /// Canonical step name; identity for ordering and hashing purposes.
    pub fn name(&self) -> String {
        self.uri.to_string()
    }

    /// Checksum of everything this step's output is derived from: each direct
    /// dependency's output checksum plus each of its own source files'
    /// checksums, combined order-independently.
    pub fn checksum_input(&self, catalog: &dyn Catalog) -> Result<String> {
        let mut pairs = catalog.source_checksums(&self.uri)?;
        for dep in &self.dependencies {
            pairs.push((dep.name(), dep.checksum_output(catalog)?));
        }
        Ok(checksum_pairs(pairs))
    }

    /// Content checksum of this step's current output, whatever produced it.
    pub fn checksum_output(&self, catalog: &dyn Catalog) -> Result<String> {
        catalog.output_checksum(&self.uri)
    }

    /// Whether this step must be rebuilt. Read-only: stats existing outputs
    /// and recomputes checksums, never mutates catalog state, so concurrent
    /// evaluation across steps is safe.
    pub fn is_dirty(&self, catalog: &dyn Catalog) -> Result<bool> {
        match self.kind {
            // Reference data participates in checksums but never runs; etag
            // freshness is entirely captured by its output checksum.
            StepKind::Reference | StepKind::Etag => Ok(false),

            // Always re-check the remote.
            StepKind::Github => Ok(true),

            // Snapshots have their own external staleness source; locally
            // they are only dirty when the payload is missing.
            StepKind::Snapshot | StepKind::Walden => {
                Ok(!catalog.output_exists(&self.uri)?)
            }

            // The grapher output lives in a database; compare its recorded
            // checksum directly, no filesystem check.
            StepKind::Grapher => {
                let recorded = catalog.recorded_source_checksum(&self.uri)?;
                Ok(recorded.as_deref() != Some(self.checksum_input(catalog)?.as_str()))
            }

            StepKind::Data | StepKind::Backport => {
                if !catalog.output_exists(&self.uri)? {
                    return Ok(true);
                }
                for dep in &self.dependencies {
                    if dep.is_dirty(catalog)? {
                        debug!(step = %self.uri, dependency = %dep.uri, "dirty via dependency");
                        return Ok(true);
                    }
                }
                let recorded = catalog.recorded_source_checksum(&self.uri)?;
                Ok(recorded.as_deref() != Some(self.checksum_input(catalog)?.as_str()))
            }
        }
    }

    /// Whether the step's own code exists. Kinds without local code are
    /// always considered executable.
    pub fn is_executable(&self, catalog: &dyn Catalog) -> Result<bool> {
        match self.kind {
            StepKind::Data | StepKind::Backport | StepKind::Grapher => {
                Ok(!catalog.source_checksums(&self.uri)?.is_empty())
            }
            _ => Ok(true),
        }
    }

    /// Execute the step and record the freshly computed input checksum, so
    /// the next invocation's dirty check sees it as clean.
    pub fn run(&self, catalog: &dyn Catalog) -> Result<()> {
        match self.kind {
            StepKind::Reference => {
                debug!(step = %self.uri, "reference step; nothing to run");
                return Ok(());
            }
            StepKind::Etag | StepKind::Github => {
                debug!(step = %self.uri, "remote step; nothing to run locally");
                return Ok(());
            }
            _ => {}
        }

        catalog.run_step(self)?;

        let checksum = self.checksum_input(catalog)?;
        catalog.record_source_checksum(&self.uri, &checksum)?;

        if !self.is_public {
            catalog.mark_output_private(&self.uri)?;
        }

        info!(step = %self.uri, "step completed");
        Ok(())
    }
}
