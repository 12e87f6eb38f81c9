// src/exec/mod.rs

//! Sequential step execution.
//!
//! Steps mutate the shared dataset store and database, so execution is
//! strictly in order and never parallel; a step only starts once everything
//! it depends on is fully materialized.

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::errors::Result;
use crate::step::Step;

/// Run an already-filtered, topologically ordered list of steps.
///
/// Fail-fast: the first step error aborts the run. The engine does not know
/// which remaining steps are unaffected by the failure, so none of them run.
pub fn run_dag(steps: &[Step], catalog: &dyn Catalog) -> Result<()> {
    let total = steps.len();
    for (i, step) in steps.iter().enumerate() {
        if !step.is_executable(catalog)? {
            warn!(step = %step.uri, "step has no source code; its run will likely fail");
        }
        info!(step = %step.uri, progress = format!("{}/{}", i + 1, total), "running step");
        step.run(catalog)?;
    }

    if total == 0 {
        info!("nothing to do; all steps up to date");
    }
    Ok(())
}
