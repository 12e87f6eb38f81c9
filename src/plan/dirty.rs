// src/plan/dirty.rs

//! Concurrent staleness detection.
//!
//! `is_dirty` only performs read-only I/O, so evaluating it for many steps at
//! once is safe; the execution phase stays strictly sequential.

use anyhow::Context;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::errors::Result;
use crate::step::Step;

/// Filter `steps` down to the ones that must be rebuilt.
///
/// Checks run on a pool of `workers` threads (`workers <= 1` degrades to a
/// plain sequential pass). Results are zipped back onto the original
/// positions, so the returned list is always a stable sub-sequence of the
/// input order regardless of check completion order.
pub fn select_dirty_steps(
    steps: Vec<Step>,
    catalog: &dyn Catalog,
    workers: usize,
) -> Result<Vec<Step>> {
    let flags: Vec<Result<bool>> = if workers <= 1 {
        steps.iter().map(|step| step.is_dirty(catalog)).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .context("building dirty-check worker pool")?;
        pool.install(|| {
            steps
                .par_iter()
                .map(|step| step.is_dirty(catalog))
                .collect()
        })
    };

    // Resolve per-step results explicitly: the first error aborts the run.
    let mut dirty = Vec::new();
    for (step, flag) in steps.into_iter().zip(flags) {
        if flag? {
            dirty.push(step);
        } else {
            debug!(step = %step.uri, "up to date");
        }
    }

    info!(dirty = dirty.len(), "staleness check complete");
    Ok(dirty)
}
