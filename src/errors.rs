// src/errors.rs

//! Crate-wide error taxonomy and `Result` alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Fatal: a step name uses a scheme the engine does not know about.
    #[error("Unrecognized step kind in '{0}'")]
    UnknownScheme(String),

    /// Fatal: the dependency graph contains a cycle.
    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    /// User-correctable: a selection pattern matched nothing (likely a typo).
    #[error("No steps matched the given patterns: {0}")]
    NoStepsMatched(String),

    /// Fatal: a public step declares a dependency on private data.
    #[error("Public step '{step}' may not depend on private step '{dependency}'")]
    PrivateDependency { step: String, dependency: String },

    /// A step's own domain logic failed; halts the whole run.
    #[error("Step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid selection pattern: {0}")]
    RegexError(#[from] regex::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EtlError>;
