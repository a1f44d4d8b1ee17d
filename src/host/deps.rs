//! Document ↔ data file dependency tracking.
//!
//! Every successful document build replaces that document's edge set with the
//! data files it was built from. Watch mode queries the reverse map to find
//! exactly the documents a changed data file invalidates.
//!
//! ```text
//! forward:  content/index.md  →  { data/site.yaml, data/team/members.json }
//! reverse:  data/site.yaml    →  { content/index.md, content/about.md }
//! ```

use crate::asset::{DependencyOptions, DependencyTracker};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Process-wide graph shared by the pipeline and the watcher.
pub static DEPENDENCY_GRAPH: LazyLock<RwLock<DependencyGraph>> =
    LazyLock::new(|| RwLock::new(DependencyGraph::default()));

#[derive(Debug, Default)]
pub struct DependencyGraph {
    forward: FxHashMap<PathBuf, FxHashSet<PathBuf>>,
    reverse: FxHashMap<PathBuf, FxHashSet<PathBuf>>,
}

impl DependencyGraph {
    /// Replace all edges of `document` with `deps`.
    pub fn record_dependencies(&mut self, document: &Path, deps: &[PathBuf]) {
        self.remove_document(document);

        if deps.is_empty() {
            return;
        }

        let set: FxHashSet<PathBuf> = deps.iter().cloned().collect();
        for dep in &set {
            self.reverse
                .entry(dep.clone())
                .or_default()
                .insert(document.to_path_buf());
        }
        self.forward.insert(document.to_path_buf(), set);
    }

    /// Drop `document` and every edge pointing to it.
    pub fn remove_document(&mut self, document: &Path) {
        let Some(old) = self.forward.remove(document) else {
            return;
        };
        for dep in old {
            if let Some(docs) = self.reverse.get_mut(&dep) {
                docs.remove(document);
                if docs.is_empty() {
                    self.reverse.remove(&dep);
                }
            }
        }
    }

    /// Documents built from `dep`.
    pub fn get_dependents(&self, dep: &Path) -> Option<&FxHashSet<PathBuf>> {
        self.reverse.get(dep)
    }

    /// Data files `document` was built from.
    pub fn get_dependencies(&self, document: &Path) -> Option<&FxHashSet<PathBuf>> {
        self.forward.get(document)
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Collects registrations for one document build.
///
/// Edges are committed to the graph by the caller once the build succeeds.
#[derive(Debug, Default)]
pub struct DocumentDeps {
    paths: Mutex<Vec<PathBuf>>,
}

impl DocumentDeps {
    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths.into_inner()
    }
}

impl DependencyTracker for DocumentDeps {
    fn add_dependency(&self, path: &Path, options: DependencyOptions) {
        if options.included_in_parent {
            self.paths.lock().push(path.to_path_buf());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_reverse_lookup() {
        let mut graph = DependencyGraph::default();
        graph.record_dependencies(&p("index.md"), &[p("data/site.yaml"), p("data/nav.json")]);
        graph.record_dependencies(&p("about.md"), &[p("data/site.yaml")]);

        let site = graph.get_dependents(&p("data/site.yaml")).unwrap();
        assert_eq!(site.len(), 2);
        assert!(site.contains(&p("index.md")));
        assert!(site.contains(&p("about.md")));

        let nav = graph.get_dependents(&p("data/nav.json")).unwrap();
        assert_eq!(nav.len(), 1);
        assert!(graph.get_dependents(&p("data/other.json")).is_none());
    }

    #[test]
    fn test_record_replaces_previous_edges() {
        let mut graph = DependencyGraph::default();
        graph.record_dependencies(&p("index.md"), &[p("data/a.json"), p("data/b.json")]);
        graph.record_dependencies(&p("index.md"), &[p("data/b.json")]);

        assert!(graph.get_dependents(&p("data/a.json")).is_none());
        assert_eq!(graph.get_dependencies(&p("index.md")).unwrap().len(), 1);
    }

    #[test]
    fn test_record_empty_removes_document() {
        let mut graph = DependencyGraph::default();
        graph.record_dependencies(&p("index.md"), &[p("data/a.json")]);
        graph.record_dependencies(&p("index.md"), &[]);

        assert!(graph.is_empty());
        assert!(graph.get_dependents(&p("data/a.json")).is_none());
    }

    #[test]
    fn test_duplicate_deps_collapse() {
        let mut graph = DependencyGraph::default();
        graph.record_dependencies(&p("index.md"), &[p("data/a.json"), p("data/a.json")]);
        assert_eq!(graph.get_dependencies(&p("index.md")).unwrap().len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut graph = DependencyGraph::default();
        graph.record_dependencies(&p("index.md"), &[p("data/a.json")]);
        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.get_dependents(&p("data/a.json")).is_none());
    }

    #[test]
    fn test_document_deps_filters_options() {
        let deps = DocumentDeps::default();
        deps.add_dependency(
            Path::new("data/a.json"),
            DependencyOptions {
                included_in_parent: true,
            },
        );
        deps.add_dependency(
            Path::new("data/b.json"),
            DependencyOptions {
                included_in_parent: false,
            },
        );
        assert_eq!(deps.into_paths(), [p("data/a.json")]);
    }
}
