//! Document build pipeline.
//!
//! Drives every document under the content directory through the
//! [`GlobalsAsset`] lifecycle and writes its outputs:
//!
//! ```text
//! content/posts/hello.md ──► prepare ──► compile ──► finalize
//!                                                       │
//!                      public/posts/hello.html  ◄───────┤  (body)
//!                      public/posts/hello.json  ◄───────┘  (merged view)
//! ```
//!
//! Documents build in parallel. A failing document is logged and counted;
//! the others still build.

use super::deps::{DependencyGraph, DocumentDeps};
use crate::{
    asset::{GlobalsAsset, Output, OutputKind},
    config::SiteConfig,
    data::CancelFlag,
    log,
    logger::Progress,
};
use anyhow::{Context, Result, bail};
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Outcome of one pipeline run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub built: usize,
    pub failed: usize,
}

impl BuildReport {
    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// All documents under `[build].content`, sorted.
pub fn collect_documents(config: &SiteConfig) -> Vec<PathBuf> {
    let mut documents: Vec<_> = WalkDir::new(&config.build.content)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name().to_str().unwrap_or_default()))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| config.is_document(path))
        .collect();
    documents.sort();
    documents
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Output file for `document` with the given kind.
///
/// `content/posts/hello.md` → `public/posts/hello.<ext>`
pub fn output_path(document: &Path, kind: OutputKind, config: &SiteConfig) -> PathBuf {
    let relative = document
        .strip_prefix(&config.build.content)
        .unwrap_or(document);
    config
        .build
        .output
        .join(relative)
        .with_extension(kind.extension())
}

/// Fail when two documents would write the same output file.
fn check_output_conflicts(documents: &[PathBuf], config: &SiteConfig) -> Result<()> {
    let mut seen: FxHashMap<PathBuf, &Path> = FxHashMap::default();
    for document in documents {
        let target = output_path(document, OutputKind::Json, config);
        if let Some(other) = seen.insert(target.clone(), document) {
            bail!(
                "`{}` and `{}` both write `{}`",
                other.display(),
                document.display(),
                target.display()
            );
        }
    }
    Ok(())
}

// ============================================================================
// Build
// ============================================================================

/// Build every document in the content directory.
///
/// Starts from an empty dependency graph.
pub fn build_site(
    config: &SiteConfig,
    graph: &RwLock<DependencyGraph>,
    clean: bool,
    cancel: Option<&CancelFlag>,
) -> Result<BuildReport> {
    let output = &config.build.output;
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clean output directory: {}", output.display()))?;
    }

    let documents = collect_documents(config);
    if documents.is_empty() {
        log!("build"; "no documents in {}", config.build.content.display());
        return Ok(BuildReport::default());
    }

    graph.write().clear();
    build_documents(&documents, config, graph, cancel)
}

/// Build the given documents in parallel.
///
/// Returns an error only for setup problems. Per-document failures are logged
/// and counted in the report.
pub fn build_documents(
    documents: &[PathBuf],
    config: &SiteConfig,
    graph: &RwLock<DependencyGraph>,
    cancel: Option<&CancelFlag>,
) -> Result<BuildReport> {
    check_output_conflicts(documents, config)?;

    let asset = config.asset();
    let progress = Progress::new("build", documents.len());

    let failed = documents
        .par_iter()
        .filter(|document| {
            let result = build_document(document, &asset, config, graph, cancel);
            if let Some(progress) = &progress {
                progress.inc();
            }
            match result {
                Ok(()) => false,
                Err(err) => {
                    log!("error"; "{:#}", err);
                    true
                }
            }
        })
        .count();

    if let Some(progress) = &progress {
        progress.finish();
    }

    Ok(BuildReport {
        built: documents.len() - failed,
        failed,
    })
}

/// Build one document and record its data dependencies.
pub fn build_document(
    document: &Path,
    asset: &GlobalsAsset,
    config: &SiteConfig,
    graph: &RwLock<DependencyGraph>,
    cancel: Option<&CancelFlag>,
) -> Result<()> {
    let content = fs::read_to_string(document)
        .with_context(|| format!("Failed to read {}", document.display()))?;

    let tracker = DocumentDeps::default();
    let prepared = asset.prepare(document, &content, &tracker, cancel)?;
    let compiled = compile(prepared.body);
    let outputs = asset.finalize(prepared.context, compiled)?;

    write_outputs(document, &outputs, config)?;

    graph
        .write()
        .record_dependencies(document, &tracker.into_paths());
    Ok(())
}

/// Body "compilation": the stripped body is emitted unchanged.
fn compile(body: String) -> Vec<Output> {
    vec![Output {
        kind: OutputKind::Html,
        value: body,
    }]
}

fn write_outputs(document: &Path, outputs: &[Output], config: &SiteConfig) -> Result<()> {
    for output in outputs {
        let path = output_path(document, output.kind, config);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, &output.value)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}
