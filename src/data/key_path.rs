//! Data file path → namespace key path resolution.
//!
//! ```text
//! <root>/team/members.json  →  ["team", "members"]  (team.members)
//! <root>/site.yaml          →  ["site"]             (site)
//! <root>/nav/v1.2.toml      →  ["nav", "v1.2"]      (nav.v1.2)
//! ```
//!
//! Only the trailing extension is removed and segments are never split on
//! dots, so a segment may itself contain `.`.

use super::error::DataError;
use compact_str::CompactString;
use smallvec::SmallVec;
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Both separators are accepted regardless of platform.
const SEPARATORS: [char; 2] = ['/', '\\'];

/// Ordered namespace segments derived from a data file's relative path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyPath(SmallVec<[CompactString; 4]>);

impl KeyPath {
    /// Resolve the key path of `path`, which must lie under `root`.
    pub fn resolve(path: &Path, root: &Path) -> Result<Self, DataError> {
        let invalid = || DataError::InvalidPath {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        };

        let relative = path.strip_prefix(root).map_err(|_| invalid())?;
        let relative = relative.to_string_lossy();

        let mut segments: SmallVec<[CompactString; 4]> = relative
            .split(SEPARATORS)
            .filter(|s| !s.is_empty() && *s != ".")
            .map(CompactString::from)
            .collect();

        let last = segments.last_mut().ok_or_else(invalid)?;
        let stem = CompactString::from(strip_extension(last));
        if stem.is_empty() {
            return Err(invalid());
        }
        *last = stem;

        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[CompactString] {
        &self.0
    }

    /// Number of segments; a file directly under the root has depth 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<CompactString>> FromIterator<S> for KeyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// Remove the trailing `.ext` of a file name. Dotfiles keep their name.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    }
}

/// A discovered data file with its resolved key path.
#[derive(Debug, Clone)]
pub struct DataFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the data root, always `/`-separated
    pub relative: String,
    /// Lower-cased extension without the dot (empty when missing)
    pub extension: String,
    pub key: KeyPath,
}

impl DataFile {
    pub fn new(path: PathBuf, root: &Path) -> Result<Self, DataError> {
        let key = KeyPath::resolve(&path, root)?;
        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        Ok(Self {
            path,
            relative,
            extension,
            key,
        })
    }
}
