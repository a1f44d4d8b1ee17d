//! Errors raised while loading or checking `globals.toml`.

use std::path::PathBuf;
use thiserror::Error;

/// Why a site configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("cannot read config `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    /// The file is not valid TOML or has unknown sections or fields.
    #[error("invalid globals.toml: {0}")]
    Parse(#[from] toml::de::Error),

    /// Well-formed TOML describing an unusable site layout.
    #[error("invalid config: {0}")]
    Validation(String),
}
