//! Error types for global data loading and front matter parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Underlying cause of a malformed data file or header.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),
}

/// A document's leading metadata block is present but unusable.
#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("front matter opened with `{0}` is never closed")]
    Unterminated(&'static str),

    #[error("front matter must be a key/value mapping, found {0}")]
    NotAMapping(&'static str),

    #[error("invalid front matter syntax")]
    Syntax(#[source] Box<FormatError>),
}

/// Errors raised while building the global data namespace.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no parser registered for `.{extension}` (file `{path}`)")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to parse data file `{path}`")]
    Parse {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("`{path}` does not lie under data root `{root}`")]
    InvalidPath { path: PathBuf, root: PathBuf },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("namespace build cancelled")]
    Cancelled,
}
