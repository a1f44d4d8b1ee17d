//! Global namespace assembly from a data directory.
//!
//! # Build Flow
//!
//! ```text
//! discover(root)                 walkdir, skip editor/OS artifacts
//!     │                          and excluded paths
//!     │
//!     ├── DataFile::new()        resolve key path per file
//!     ├── sort                   (depth, relative path)
//!     │
//! load (rayon, parallel)         FormatRegistry::load per file
//!     │                          collected in sorted order
//!     ▼
//! insert_at (sequential)         ensure path, then set leaf
//! ```
//!
//! # Collision Policy
//!
//! Files are applied shallow-first, then lexically by relative path. A deeper
//! key path replaces a non-object value standing in its way and nests into an
//! object it finds there:
//!
//! ```text
//! a.json   = {"x": 1}      ─┐
//! a/b.json = {"y": 2}      ─┴─►  {"a": {"x": 1, "b": {"y": 2}}}
//!
//! a.json   = 5             ─┐
//! a/b.json = {"y": 2}      ─┴─►  {"a": {"b": {"y": 2}}}
//! ```
//!
//! Two files with the same key path (`a.json`, `a.yaml`) resolve to the
//! lexically later one. Loads may finish in any order; application order
//! never depends on it.
//!
//! # Skipped Entries
//!
//! Not every regular file under the root is data. Discovery skips, with
//! everything below them:
//!
//! - hidden entries (`.git/`, `.env`) and OS metadata (`.DS_Store`, `Thumbs.db`)
//! - editor leftovers ending in `~`, `.swp`, `.swo`, `.tmp` or `.bak`
//! - paths passed to [`NamespaceBuilder::with_excluded`], which hosts use for
//!   their content, output and config paths when these lie under the root

use super::error::DataError;
use super::key_path::DataFile;
use super::loader::FormatRegistry;
use compact_str::CompactString;
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Shared cancellation signal for an in-flight namespace build.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), DataError> {
        if self.is_cancelled() {
            Err(DataError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A built namespace and the files it was built from.
#[derive(Debug, Clone)]
pub struct GlobalNamespace {
    /// Always a JSON object
    pub value: Value,
    /// Every loaded file, in application order
    pub files: Vec<DataFile>,
}

impl GlobalNamespace {
    pub fn empty() -> Self {
        Self {
            value: Value::Object(Map::new()),
            files: Vec::new(),
        }
    }

    /// Paths the namespace depends on, one per loaded file.
    pub fn dependencies(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|file| file.path.as_path())
    }
}

/// Builds a fresh [`GlobalNamespace`] on every call; nothing is cached.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceBuilder<'a> {
    registry: &'a FormatRegistry,
    cancel: Option<&'a CancelFlag>,
    excluded: &'a [PathBuf],
}

impl<'a> NamespaceBuilder<'a> {
    pub const fn new(registry: &'a FormatRegistry) -> Self {
        Self {
            registry,
            cancel: None,
            excluded: &[],
        }
    }

    pub fn with_cancel(mut self, cancel: &'a CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Skip these files or directories during discovery.
    pub fn with_excluded(mut self, excluded: &'a [PathBuf]) -> Self {
        self.excluded = excluded;
        self
    }

    /// Build the namespace for `root`.
    ///
    /// A missing or empty root yields an empty namespace. Any unreadable,
    /// unsupported or malformed file fails the whole build.
    pub fn build(&self, root: &Path) -> Result<GlobalNamespace, DataError> {
        let files = self.discover(root)?;
        if files.is_empty() {
            return Ok(GlobalNamespace::empty());
        }

        let values = files
            .par_iter()
            .map(|file| {
                self.check_cancelled()?;
                self.registry.load(&file.path)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut namespace = Map::new();
        for (file, value) in files.iter().zip(values) {
            insert_at(&mut namespace, file.key.segments(), value);
        }

        Ok(GlobalNamespace {
            value: Value::Object(namespace),
            files,
        })
    }

    /// Enumerate data files under `root` in application order.
    fn discover(&self, root: &Path) -> Result<Vec<DataFile>, DataError> {
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(is_ignored(e.file_name().to_str().unwrap_or_default())
                        || self.excluded.iter().any(|path| e.path() == path))
            });

        for entry in walker {
            self.check_cancelled()?;
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(root).to_path_buf();
                DataError::Io(path, err.into())
            })?;
            if entry.file_type().is_file() {
                files.push(DataFile::new(entry.into_path(), root)?);
            }
        }

        files.sort_by(|a, b| {
            a.key
                .depth()
                .cmp(&b.key.depth())
                .then_with(|| a.relative.cmp(&b.relative))
        });
        Ok(files)
    }

    fn check_cancelled(&self) -> Result<(), DataError> {
        self.cancel.map_or(Ok(()), CancelFlag::check)
    }
}

/// Skip OS metadata, hidden entries and editor backups.
fn is_ignored(name: &str) -> bool {
    IGNORED_FILES.contains(&name)
        || name.starts_with('.')
        || name.ends_with('~')
        || [".swp", ".swo", ".tmp", ".bak"]
            .iter()
            .any(|ext| name.ends_with(ext))
}

/// Set `value` at `segments`, creating intermediate objects as needed.
///
/// Total: a non-object on the way is replaced by an object.
pub fn insert_at(target: &mut Map<String, Value>, segments: &[CompactString], value: Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    let mut node = target;
    for segment in parents {
        let slot = node
            .entry(segment.as_str())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(map) = slot else {
            unreachable!("slot was just made an object");
        };
        node = map;
    }
    node.insert(leaf.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn build(root: &Path) -> Result<GlobalNamespace, DataError> {
        NamespaceBuilder::new(&FormatRegistry::default()).build(root)
    }

    fn keys(segments: &[&str]) -> Vec<CompactString> {
        segments.iter().map(|s| CompactString::from(*s)).collect()
    }

    #[test]
    fn test_assembly() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"x": 1}"#);
        write(dir.path(), "b/c.json", r#"{"y": 2}"#);

        let namespace = build(dir.path()).unwrap();
        assert_eq!(namespace.value, json!({"a": {"x": 1}, "b": {"c": {"y": 2}}}));
    }

    #[test]
    fn test_mixed_formats() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "site.yaml", "title: Blog\n");
        write(dir.path(), "team/members.toml", "names = [\"ada\", \"alan\"]\n");

        let namespace = build(dir.path()).unwrap();
        assert_eq!(
            namespace.value,
            json!({"site": {"title": "Blog"}, "team": {"members": {"names": ["ada", "alan"]}}})
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let namespace = build(&dir.path().join("nope")).unwrap();
        assert_eq!(namespace.value, json!({}));
        assert_eq!(namespace.dependencies().count(), 0);
    }

    #[test]
    fn test_empty_root_is_empty() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        let namespace = build(dir.path()).unwrap();
        assert_eq!(namespace.value, json!({}));
        assert!(namespace.files.is_empty());
    }

    #[test]
    fn test_dependencies_complete_and_distinct() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", "1");
        write(dir.path(), "b.yaml", "2");
        write(dir.path(), "c/d.toml", "x = 3");

        let namespace = build(dir.path()).unwrap();
        let mut deps: Vec<_> = namespace.dependencies().collect();
        assert_eq!(deps.len(), 3);
        deps.sort();
        deps.dedup();
        assert_eq!(deps.len(), 3);
        assert!(deps.iter().all(|p| p.starts_with(dir.path())));
    }

    #[test]
    fn test_malformed_file_fails_whole_build() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.json", r#"{"ok": true}"#);
        write(dir.path(), "bad.json", r#"{"ok": "#);

        let err = build(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::Parse { ref path, .. } if path.ends_with("bad.json")));
    }

    #[test]
    fn test_unsupported_file_fails_build() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.txt", "plain");
        assert!(matches!(
            build(dir.path()).unwrap_err(),
            DataError::UnsupportedFormat { .. }
        ));
    }

    #[test]
    fn test_ignored_entries() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", "1");
        write(dir.path(), ".DS_Store", "junk");
        write(dir.path(), "a.json~", "junk");
        write(dir.path(), ".git/config", "junk");
        write(dir.path(), ".a.json.swp", "junk");

        let namespace = build(dir.path()).unwrap();
        assert_eq!(namespace.value, json!({"a": 1}));
        assert_eq!(namespace.files.len(), 1);
    }

    #[test]
    fn test_excluded_paths_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "site.yaml", "title: Blog\n");
        write(dir.path(), "public/index.html", "<p>out</p>");
        write(dir.path(), "content/index.html", "<p>in</p>");
        write(dir.path(), "globals.toml", "[data]\ndir = \".\"\n");

        let registry = FormatRegistry::default();
        let excluded = [
            dir.path().join("public"),
            dir.path().join("content"),
            dir.path().join("globals.toml"),
        ];
        let namespace = NamespaceBuilder::new(&registry)
            .with_excluded(&excluded)
            .build(dir.path())
            .unwrap();

        assert_eq!(namespace.value, json!({"site": {"title": "Blog"}}));
        assert_eq!(namespace.files.len(), 1);
    }

    #[test]
    fn test_excluded_root_itself_is_walked() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", "1");

        let registry = FormatRegistry::default();
        let excluded = [dir.path().to_path_buf()];
        let namespace = NamespaceBuilder::new(&registry)
            .with_excluded(&excluded)
            .build(dir.path())
            .unwrap();
        assert_eq!(namespace.value, json!({"a": 1}));
    }

    #[test]
    fn test_deeper_path_nests_into_object() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"x": 1}"#);
        write(dir.path(), "a/b.json", r#"{"y": 2}"#);

        let namespace = build(dir.path()).unwrap();
        assert_eq!(namespace.value, json!({"a": {"x": 1, "b": {"y": 2}}}));
    }

    #[test]
    fn test_deeper_path_wins_over_scalar() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", "5");
        write(dir.path(), "a/b.json", r#"{"y": 2}"#);

        let namespace = build(dir.path()).unwrap();
        assert_eq!(namespace.value, json!({"a": {"b": {"y": 2}}}));
        // The shadowed file is still a dependency
        assert_eq!(namespace.files.len(), 2);
    }

    #[test]
    fn test_deeper_path_wins_over_same_key() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"b": "shallow"}"#);
        write(dir.path(), "a/b.json", r#""deep""#);

        let namespace = build(dir.path()).unwrap();
        assert_eq!(namespace.value, json!({"a": {"b": "deep"}}));
    }

    #[test]
    fn test_same_key_path_lexically_later_wins() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#""from json""#);
        write(dir.path(), "a.yaml", "from yaml");

        let namespace = build(dir.path()).unwrap();
        assert_eq!(namespace.value, json!({"a": "from yaml"}));
    }

    #[test]
    fn test_application_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "z/deep.json", "1");
        write(dir.path(), "b.json", "2");
        write(dir.path(), "a.json", "3");

        let namespace = build(dir.path()).unwrap();
        let order: Vec<_> = namespace.files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(order, ["a.json", "b.json", "z/deep.json"]);
    }

    #[test]
    fn test_cancelled_build_fails() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", "1");

        let registry = FormatRegistry::default();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = NamespaceBuilder::new(&registry)
            .with_cancel(&cancel)
            .build(dir.path())
            .unwrap_err();
        assert!(matches!(err, DataError::Cancelled));
    }

    #[test]
    fn test_rebuild_sees_changes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", "1");
        assert_eq!(build(dir.path()).unwrap().value, json!({"a": 1}));

        write(dir.path(), "a.json", "2");
        assert_eq!(build(dir.path()).unwrap().value, json!({"a": 2}));
    }

    #[test]
    fn test_insert_at_creates_parents() {
        let mut map = Map::new();
        insert_at(&mut map, &keys(&["a", "b", "c"]), json!(1));
        assert_eq!(Value::Object(map), json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_insert_at_replaces_non_object() {
        let mut map = Map::new();
        insert_at(&mut map, &keys(&["a"]), json!([1, 2]));
        insert_at(&mut map, &keys(&["a", "b"]), json!(true));
        assert_eq!(Value::Object(map), json!({"a": {"b": true}}));
    }

    #[test]
    fn test_insert_at_empty_path_is_noop() {
        let mut map = Map::new();
        insert_at(&mut map, &[], json!(1));
        assert!(map.is_empty());
    }
}
