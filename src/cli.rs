// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `etlcat`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "etlcat",
    version,
    about = "Incrementally rebuild stale steps of an ETL dependency graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Selection patterns matched against step names (regex search).
    ///
    /// With no patterns, every step in the DAG is selected.
    #[arg(value_name = "PATTERN")]
    pub steps: Vec<String>,

    /// Path to the root DAG document (TOML).
    #[arg(long, value_name = "PATH", default_value = "dag.toml")]
    pub dag: String,

    /// Comma-separated patterns of steps to drop from the plan.
    #[arg(long, value_name = "PATTERNS")]
    pub exclude: Option<String>,

    /// Also select steps that (transitively) depend on the matched ones.
    #[arg(long)]
    pub downstream: bool,

    /// Select exactly the matched steps, without ancestors or dependents.
    ///
    /// Takes precedence over --downstream.
    #[arg(long)]
    pub only: bool,

    /// Allow private steps to be scheduled.
    #[arg(long)]
    pub private: bool,

    /// Treat every planned step as dirty, skipping the staleness check.
    #[arg(long)]
    pub force: bool,

    /// Print the execution plan without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Worker-pool size for the staleness check (1 = fully sequential).
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub workers: usize,

    /// Print the version-tracker table and audit warnings, then exit.
    #[arg(long)]
    pub audit: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ETLCAT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// Exclude patterns split out of the comma-separated flag value.
    pub fn exclude_patterns(&self) -> Vec<String> {
        self.exclude
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
