// src/lib.rs

pub mod catalog;
pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod plan;
pub mod step;
pub mod tracker;

use tracing::info;

use crate::catalog::LocalCatalog;
use crate::cli::CliArgs;
use crate::config::{load_dag, validate_dag};
use crate::errors::Result;
use crate::plan::{compile_steps, select_dirty_steps};
use crate::step::Step;
use crate::tracker::VersionTracker;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - DAG document loading and the validation gate
/// - build planning (selection, ordering)
/// - the concurrent staleness check
/// - sequential execution
pub fn run(args: CliArgs) -> Result<()> {
    let dag = load_dag(&args.dag)?;
    validate_dag(&dag)?;

    if args.audit {
        print_audit(&dag)?;
        return Ok(());
    }

    let excludes = args.exclude_patterns();
    let mut steps = compile_steps(&dag, &args.steps, &excludes, args.downstream, args.only)?;

    if !args.private {
        steps.retain(|step| step.is_public);
    }

    let catalog = LocalCatalog::new(".")?;

    let steps = if args.force {
        info!(steps = steps.len(), "forcing rebuild of all planned steps");
        steps
    } else {
        select_dirty_steps(steps, &catalog, args.workers.max(1))?
    };

    if args.dry_run {
        print_plan(&steps);
        return Ok(());
    }

    exec::run_dag(&steps, &catalog)
}

/// Dry-run output: the steps that would run, in order.
fn print_plan(steps: &[Step]) {
    if steps.is_empty() {
        println!("nothing to do; all steps up to date");
        return;
    }

    println!("would run {} step(s):", steps.len());
    for step in steps {
        println!("  - {}", step.uri);
        for dep in &step.dependencies {
            println!("      <- {}", dep.uri);
        }
    }
}

fn print_audit(dag: &dag::Dag) -> Result<()> {
    let tracker = VersionTracker::from_dag(dag)?;

    println!("{} tracked step(s):", tracker.records().count());
    for record in tracker.records() {
        println!(
            "  {} (deps: {}, direct usages: {}, total usages: {})",
            record.name,
            record.direct_dependencies.len(),
            record.direct_usages.len(),
            record.all_usages.len()
        );
    }

    let findings = tracker.audit();
    if findings.is_empty() {
        println!("no audit findings");
    } else {
        for finding in &findings {
            tracing::warn!("{finding}");
            println!("warning: {finding}");
        }
    }
    Ok(())
}
