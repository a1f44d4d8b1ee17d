//! Document lifecycle adapter for host build pipelines.
//!
//! A host drives each document through two calls:
//!
//! ```text
//!             raw content
//!                  │
//!                  ▼
//!  prepare() ──► NamespaceBuilder::build(data_root)
//!     │              └── tracker.add_dependency(file) for every data file
//!     │          front_matter::merge()
//!     │
//!     ├──► body            host compiles it (markup → html, ...)
//!     └──► DocumentContext
//!                  │
//!                  ▼
//!  finalize(context, outputs) ──► outputs + [json: merged view]
//! ```
//!
//! The context is an explicit value owned by the caller between the two
//! calls. Nothing is shared across documents or rebuilds.

use crate::data::{
    CancelFlag, DataError, FormatRegistry, FrontMatterError, GlobalNamespace, NamespaceBuilder,
    merge,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How a registered dependency participates in invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyOptions {
    /// A change to the dependency invalidates the document itself
    pub included_in_parent: bool,
}

/// Dependency registration API of the host.
///
/// One tracker is scoped to one document build.
pub trait DependencyTracker {
    fn add_dependency(&self, path: &Path, options: DependencyOptions);
}

/// Kind of an emitted output, used by hosts to pick a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Html,
    Json,
}

impl OutputKind {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

/// One output produced for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub kind: OutputKind,
    pub value: String,
}

/// Errors surfaced for a single document. Other documents are unaffected.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load global data for `{document}`")]
    Data {
        document: PathBuf,
        #[source]
        source: DataError,
    },

    #[error("invalid front matter in `{document}`")]
    FrontMatter {
        document: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("failed to serialize data for `{document}`")]
    Serialize {
        document: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// State carried from `prepare` to `finalize` for one document build.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    document: PathBuf,
    namespace: GlobalNamespace,
    front_matter: Map<String, Value>,
    view: Map<String, Value>,
}

impl DocumentContext {
    pub fn document(&self) -> &Path {
        &self.document
    }

    pub const fn namespace(&self) -> &GlobalNamespace {
        &self.namespace
    }

    pub const fn front_matter(&self) -> &Map<String, Value> {
        &self.front_matter
    }

    /// Front matter plus `globals`, as exposed to templates.
    pub const fn view(&self) -> &Map<String, Value> {
        &self.view
    }
}

/// Result of the `prepare` call.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Body without its header, for the host to compile
    pub body: String,
    pub context: DocumentContext,
}

/// Front matter + global data adapter.
#[derive(Debug, Clone)]
pub struct GlobalsAsset {
    data_root: PathBuf,
    registry: FormatRegistry,
    /// Paths under the data root that are not data
    excluded: Vec<PathBuf>,
}

impl GlobalsAsset {
    pub fn new(data_root: impl Into<PathBuf>, registry: FormatRegistry) -> Self {
        Self {
            data_root: data_root.into(),
            registry,
            excluded: Vec::new(),
        }
    }

    /// Keep host-owned paths (content, output, config) out of the namespace.
    pub fn with_excluded(mut self, excluded: Vec<PathBuf>) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Build the global namespace without a document.
    pub fn globals(&self, cancel: Option<&CancelFlag>) -> Result<GlobalNamespace, DataError> {
        let builder = NamespaceBuilder::new(&self.registry).with_excluded(&self.excluded);
        match cancel {
            Some(cancel) => builder.with_cancel(cancel).build(&self.data_root),
            None => builder.build(&self.data_root),
        }
    }

    /// Strip the header of `content` and build its merged view.
    ///
    /// Registers every data file as a dependency of `document` once the
    /// namespace is complete. On failure nothing is returned.
    pub fn prepare(
        &self,
        document: &Path,
        content: &str,
        tracker: &dyn DependencyTracker,
        cancel: Option<&CancelFlag>,
    ) -> Result<Prepared, AssetError> {
        let namespace = self.globals(cancel).map_err(|source| AssetError::Data {
            document: document.to_path_buf(),
            source,
        })?;

        let options = DependencyOptions {
            included_in_parent: true,
        };
        for path in namespace.dependencies() {
            tracker.add_dependency(path, options);
        }

        let merged =
            merge(content, &namespace.value).map_err(|source| AssetError::FrontMatter {
                document: document.to_path_buf(),
                source,
            })?;

        Ok(Prepared {
            body: merged.body,
            context: DocumentContext {
                document: document.to_path_buf(),
                namespace,
                front_matter: merged.front_matter,
                view: merged.view,
            },
        })
    }

    /// Append the merged view as an indented JSON output.
    pub fn finalize(
        &self,
        context: DocumentContext,
        mut generated: Vec<Output>,
    ) -> Result<Vec<Output>, AssetError> {
        let value =
            serde_json::to_string_pretty(&context.view).map_err(|source| AssetError::Serialize {
                document: context.document,
                source,
            })?;

        generated.push(Output {
            kind: OutputKind::Json,
            value,
        });
        Ok(generated)
    }
}
