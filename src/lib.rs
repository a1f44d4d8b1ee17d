//! Global data files merged with document front matter.
//!
//! - [`data`]: data root → namespace, front matter parsing and merging
//! - [`asset`]: two-call document lifecycle for host pipelines
//! - [`host`]: dependency graph and document pipeline
//! - [`watch`]: debounced rebuilds of affected documents

pub mod asset;
pub mod cli;
pub mod config;
pub mod data;
pub mod host;
pub mod logger;
pub mod watch;
