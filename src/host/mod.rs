//! Minimal host driving documents through [`crate::asset::GlobalsAsset`].
//!
//! - [`deps`]: document ↔ data file dependency graph
//! - [`pipeline`]: document discovery, parallel build, output writing

pub mod deps;
pub mod pipeline;

pub use deps::{DEPENDENCY_GRAPH, DependencyGraph, DocumentDeps};
pub use pipeline::{BuildReport, build_documents, build_site, collect_documents};
