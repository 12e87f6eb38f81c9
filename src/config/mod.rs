// src/config/mod.rs

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_dag, merge_graphs};
pub use model::DagFile;
pub use validate::validate_dag;
