//! Site configuration management for `globals.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[build]`   | Document source and output paths                 |
//! | `[data]`    | Data root and extension → format mappings        |
//!
//! # Example
//!
//! ```toml
//! [build]
//! content = "content"
//! output = "public"
//!
//! [data]
//! dir = "data"
//!
//! [data.formats]
//! json5 = "json"
//! ```
//!
//! The config file is optional: without one, every field takes its default.

mod build;
mod data;
pub mod defaults;
mod error;
pub mod handle;

pub use build::BuildConfig;
pub use data::DataConfig;
pub use error::ConfigError;
pub use handle::{cfg, init_config, reload_config};

use crate::asset::GlobalsAsset;
use crate::cli::Cli;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing globals.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Document pipeline settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Global data settings
    #[serde(default)]
    pub data: DataConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load, apply CLI overrides and validate.
    ///
    /// A missing config file is not an error; defaults are used.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;

        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf());
    }

    /// Resolved data root.
    pub fn data_root(&self) -> &Path {
        &self.data.dir
    }

    /// Adapter configured for this site's data root and formats.
    pub fn asset(&self) -> GlobalsAsset {
        GlobalsAsset::new(self.data.dir.clone(), self.data.registry())
            .with_excluded(self.data_exclusions())
    }

    /// Content, output and config paths lying inside the data root.
    ///
    /// Only non-empty when the data root is an ancestor of them, as with
    /// `dir = "."`.
    pub fn data_exclusions(&self) -> Vec<PathBuf> {
        let root = self.data_root();
        [&self.build.content, &self.build.output, &self.config_path]
            .into_iter()
            .filter(|path| path.starts_with(root) && path.as_path() != root)
            .cloned()
            .collect()
    }

    /// Whether `path` has one of the configured document extensions.
    pub fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.build
                    .documents
                    .iter()
                    .any(|doc| doc.eq_ignore_ascii_case(ext))
            })
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.data.dir, cli.data.as_ref());
        if let Some(args) = cli.build_args() {
            Self::update_option(&mut self.build.content, args.content.as_ref());
            Self::update_option(&mut self.build.output, args.output.as_ref());
        }

        self.update_path_with_root(&root, &cli.config);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make all paths absolute, relative to root
    fn update_path_with_root(&mut self, root: &Path, config_file: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config_file));
        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));

        let expanded = shellexpand::tilde(&self.data.dir.to_string_lossy()).into_owned();
        self.data.dir = Self::normalize_path(&root.join(expanded));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    pub fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command
    pub fn validate(&self) -> Result<()> {
        if let Some((ext, _)) = self
            .data
            .formats
            .iter()
            .find(|(ext, _)| ext.trim_start_matches('.').is_empty())
        {
            bail!(ConfigError::Validation(format!(
                "[data.formats] has an empty extension: `{ext}`"
            )));
        }

        if self.build.documents.is_empty() {
            bail!(ConfigError::Validation(
                "[build.documents] must have at least one element".into()
            ));
        }

        let Some(cli) = self.cli else {
            return Ok(());
        };
        if cli.build_args().is_some() {
            if !self.build.content.is_dir() {
                bail!(ConfigError::Validation(format!(
                    "content directory not found: {}",
                    self.build.content.display()
                )));
            }
            if self.build.output == self.build.content
                || self.build.content.starts_with(&self.build.output)
            {
                bail!(ConfigError::Validation(
                    "[build.output] must not contain the content directory".into()
                ));
            }
            if self.data.dir.starts_with(&self.build.output) {
                bail!(ConfigError::Validation(
                    "[data.dir] must not be inside [build.output]".into()
                ));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn leak_cli(args: &[&str]) -> &'static Cli {
        Box::leak(Box::new(Cli::try_parse_from(args).unwrap()))
    }

    #[test]
    fn test_from_str_empty() {
        let config = SiteConfig::from_str("").unwrap();
        assert_eq!(config.data.dir, PathBuf::from("data"));
        assert_eq!(config.build.content, PathBuf::from("content"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(SiteConfig::from_str("[serve]\nport = 1").is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SiteConfig::from_path(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }

    #[test]
    fn test_update_with_cli_resolves_paths() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = leak_cli(&["tola-globals", "--root", root, "-d", "_data", "build", "-o", "dist"]);

        let mut config = SiteConfig::default();
        config.update_with_cli(cli);

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.get_root(), root);
        assert_eq!(config.config_path, root.join("globals.toml"));
        assert_eq!(config.build.content, root.join("content"));
        assert_eq!(config.build.output, root.join("dist"));
        assert_eq!(config.data_root(), root.join("_data"));
    }

    #[test]
    fn test_data_dir_dot_is_project_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = leak_cli(&["tola-globals", "--root", root, "-d", ".", "data"]);

        let mut config = SiteConfig::default();
        config.update_with_cli(cli);
        assert_eq!(config.data_root(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("globals.toml"),
            "[data]\ndir = \"shared\"\n[data.formats]\njson5 = \"json\"\n",
        )
        .unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = leak_cli(&["tola-globals", "--root", root, "data"]);

        let config = SiteConfig::load(cli).unwrap();
        assert!(config.data_root().ends_with("shared"));
        assert_eq!(config.data.formats.len(), 1);
    }

    #[test]
    fn test_validate_missing_content_dir() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = leak_cli(&["tola-globals", "--root", root, "build"]);

        let err = SiteConfig::load(cli).unwrap_err();
        assert!(err.to_string().contains("content directory not found"));
    }

    #[test]
    fn test_validate_output_contains_content() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("public/content")).unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = leak_cli(&["tola-globals", "--root", root, "build", "-c", "public/content"]);

        assert!(SiteConfig::load(cli).is_err());
    }

    #[test]
    fn test_validate_empty_format_extension() {
        let mut config = SiteConfig::default();
        config
            .data
            .formats
            .insert(".".into(), crate::data::DataFormat::Json);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_data_exclusions_for_project_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = leak_cli(&["tola-globals", "--root", root, "-d", ".", "data"]);

        let mut config = SiteConfig::default();
        config.update_with_cli(cli);

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(
            config.data_exclusions(),
            [root.join("content"), root.join("public"), root.join("globals.toml")]
        );
    }

    #[test]
    fn test_data_exclusions_for_separate_dir() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = leak_cli(&["tola-globals", "--root", root, "data"]);

        let mut config = SiteConfig::default();
        config.update_with_cli(cli);
        assert!(config.data_exclusions().is_empty());
    }

    #[test]
    fn test_is_document() {
        let config = SiteConfig::default();
        assert!(config.is_document(Path::new("content/index.md")));
        assert!(config.is_document(Path::new("content/About.HTML")));
        assert!(!config.is_document(Path::new("content/logo.png")));
        assert!(!config.is_document(Path::new("content/README")));
    }
}
