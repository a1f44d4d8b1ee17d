//! `[build]` section configuration.
//!
//! Contains the document source and output directories.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in globals.toml - document pipeline paths.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"               # Documents with front matter
/// output = "public"                 # Body + data artifact per document
/// documents = ["md", "html"]        # Extensions treated as documents
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Document source directory.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// File extensions (without dot) processed as documents.
    /// Other files in the content directory are ignored.
    #[serde(default = "defaults::build::documents")]
    #[educe(Default = defaults::build::documents())]
    pub documents: Vec<String>,
}
