//! Data file loading by extension.
//!
//! | Format         | Extensions        | Value                               |
//! |----------------|-------------------|-------------------------------------|
//! | `json`         | `json`            | any JSON value                      |
//! | `yaml`         | `yaml`, `yml`     | any YAML value                      |
//! | `toml`         | `toml`            | top-level table                     |
//! | `front-matter` | `md`, `markdown`  | header keys plus `content` = body   |
//!
//! Extensions are matched case-insensitively. The table is a default; the
//! `[data.formats]` config section adds or remaps extensions.

use super::error::{DataError, FormatError};
use super::{front_matter, value};
use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fs, path::Path};

/// Key under which a front-matter data file exposes its body text.
pub const CONTENT_KEY: &str = "content";

/// Parser selected for a data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataFormat {
    Json,
    Yaml,
    Toml,
    FrontMatter,
}

impl DataFormat {
    const BUILTIN: &'static [(&'static str, Self)] = &[
        ("json", Self::Json),
        ("yaml", Self::Yaml),
        ("yml", Self::Yaml),
        ("toml", Self::Toml),
        ("md", Self::FrontMatter),
        ("markdown", Self::FrontMatter),
    ];

    /// Parse file content in this format.
    pub fn parse(self, content: &str) -> Result<Value, FormatError> {
        Ok(match self {
            Self::Json => serde_json::from_str(content)?,
            Self::Yaml => value::from_yaml(serde_yaml::from_str(content)?),
            Self::Toml => value::from_toml_table(toml::from_str(content)?),
            Self::FrontMatter => {
                let document = front_matter::parse(content)?;
                let mut data = document.data;
                data.insert(CONTENT_KEY.to_owned(), Value::String(document.body.to_owned()));
                Value::Object(data)
            }
        })
    }
}

/// Extension → format table used by the loader.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    formats: FxHashMap<CompactString, DataFormat>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let formats = DataFormat::BUILTIN
            .iter()
            .map(|&(ext, format)| (CompactString::from(ext), format))
            .collect();
        Self { formats }
    }
}

impl FormatRegistry {
    /// Built-in table extended with configured overrides.
    pub fn with_overrides(overrides: &HashMap<String, DataFormat>) -> Self {
        let mut registry = Self::default();
        for (ext, &format) in overrides {
            registry.register(ext, format);
        }
        registry
    }

    pub fn register(&mut self, extension: &str, format: DataFormat) {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        self.formats.insert(ext.into(), format);
    }

    pub fn format_for(&self, extension: &str) -> Option<DataFormat> {
        self.formats
            .get(extension.to_ascii_lowercase().as_str())
            .copied()
    }

    /// Read and parse one data file. No caching: every call hits the disk.
    pub fn load(&self, path: &Path) -> Result<Value, DataError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let format = self
            .format_for(extension)
            .ok_or_else(|| DataError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension.to_owned(),
            })?;

        let content =
            fs::read_to_string(path).map_err(|err| DataError::Io(path.to_path_buf(), err))?;

        format.parse(&content).map_err(|source| DataError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.json", r#"{"x": 1, "list": [1, 2]}"#);
        let value = FormatRegistry::default().load(&path).unwrap();
        assert_eq!(value, json!({"x": 1, "list": [1, 2]}));
    }

    #[test]
    fn test_load_json_scalar_and_array() {
        let dir = TempDir::new().unwrap();
        let registry = FormatRegistry::default();
        assert_eq!(registry.load(&write(&dir, "n.json", "42")).unwrap(), json!(42));
        assert_eq!(registry.load(&write(&dir, "l.json", "[\"a\"]")).unwrap(), json!(["a"]));
    }

    #[test]
    fn test_load_yaml_both_extensions() {
        let dir = TempDir::new().unwrap();
        let registry = FormatRegistry::default();
        let a = registry.load(&write(&dir, "a.yaml", "title: Site\n")).unwrap();
        let b = registry.load(&write(&dir, "b.yml", "- 1\n- 2\n")).unwrap();
        assert_eq!(a, json!({"title": "Site"}));
        assert_eq!(b, json!([1, 2]));
    }

    #[test]
    fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "site.toml", "title = \"Site\"\n[social]\ngithub = \"me\"\n");
        let value = FormatRegistry::default().load(&path).unwrap();
        assert_eq!(value, json!({"title": "Site", "social": {"github": "me"}}));
    }

    #[test]
    fn test_load_front_matter_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bio.md", "---\nname: Ada\n---\nWrote programs.\n");
        let value = FormatRegistry::default().load(&path).unwrap();
        assert_eq!(value, json!({"name": "Ada", "content": "Wrote programs.\n"}));
    }

    #[test]
    fn test_extension_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "A.JSON", "{}");
        assert_eq!(FormatRegistry::default().load(&path).unwrap(), json!({}));
    }

    #[test]
    fn test_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let registry = FormatRegistry::default();

        let err = registry.load(&write(&dir, "notes.txt", "hi")).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedFormat { ref extension, .. } if extension == "txt"));

        let err = registry.load(&write(&dir, "README", "hi")).unwrap_err();
        assert!(matches!(err, DataError::UnsupportedFormat { ref extension, .. } if extension.is_empty()));
    }

    #[test]
    fn test_parse_error_carries_path() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.json", "{\"x\": ");
        let err = FormatRegistry::default().load(&path).unwrap_err();
        match err {
            DataError::Parse { path: p, source } => {
                assert_eq!(p, path);
                assert!(matches!(source, FormatError::Json(_)));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_overrides() {
        let overrides = HashMap::from([
            ("json5".to_string(), DataFormat::Json),
            (".MD".to_string(), DataFormat::Yaml),
        ]);
        let registry = FormatRegistry::with_overrides(&overrides);
        assert_eq!(registry.format_for("json5"), Some(DataFormat::Json));
        assert_eq!(registry.format_for("md"), Some(DataFormat::Yaml));
        assert_eq!(registry.format_for("toml"), Some(DataFormat::Toml));
    }

    #[test]
    fn test_format_names() {
        let format: DataFormat = serde_json::from_value(json!("front-matter")).unwrap();
        assert_eq!(format, DataFormat::FrontMatter);
    }
}
