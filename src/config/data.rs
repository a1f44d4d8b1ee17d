//! `[data]` section configuration.
//!
//! Where global data files live and how their extensions map to parsers.

use super::defaults;
use crate::data::{DataFormat, FormatRegistry};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf};

/// `[data]` section in globals.toml.
///
/// # Example
/// ```toml
/// [data]
/// dir = "data"          # or "." to use the project root itself
///
/// [data.formats]
/// json5 = "json"
/// txt = "yaml"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Data root directory, relative to the project root. `~` is expanded.
    #[serde(default = "defaults::data::dir")]
    #[educe(Default = defaults::data::dir())]
    pub dir: PathBuf,

    /// Extra extension → format mappings, applied over the built-in table.
    #[serde(default)]
    pub formats: HashMap<String, DataFormat>,
}

impl DataConfig {
    /// Loader table for this configuration.
    pub fn registry(&self) -> FormatRegistry {
        FormatRegistry::with_overrides(&self.formats)
    }
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use crate::data::DataFormat;
    use std::path::PathBuf;

    #[test]
    fn test_data_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.data.dir, PathBuf::from("data"));
        assert!(config.data.formats.is_empty());
    }

    #[test]
    fn test_data_config_formats() {
        let config = r#"
            [data]
            dir = "_data"

            [data.formats]
            json5 = "json"
            mdx = "front-matter"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.data.dir, PathBuf::from("_data"));
        let registry = config.data.registry();
        assert_eq!(registry.format_for("json5"), Some(DataFormat::Json));
        assert_eq!(registry.format_for("mdx"), Some(DataFormat::FrontMatter));
        assert_eq!(registry.format_for("yaml"), Some(DataFormat::Yaml));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let config = r#"
            [data.formats]
            ini = "ini"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }
}
