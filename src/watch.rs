//! File system watcher with precise invalidation.
//!
//! Monitors the data root, the content directory and the config file, and
//! rebuilds only the documents a change affects.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Event Loop                              │
//! │                                                              │
//! │  ┌──────────┐    ┌──────────┐    ┌────────────────────────┐  │
//! │  │ notify   │───▶│ Debouncer│───▶│    handle_changes()    │  │
//! │  │ events   │    │ (300ms)  │    │                        │  │
//! │  └──────────┘    └──────────┘    │  config  → reload+full │  │
//! │                                  │  data    → dependents  │  │
//! │                                  │  content → that file   │  │
//! │                                  └────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A data file nobody depends on yet (new file, or one whose last build
//! failed) falls back to rebuilding every document.

use crate::{
    config::{SiteConfig, cfg, reload_config},
    data::CancelFlag,
    host::{BuildReport, DEPENDENCY_GRAPH, DependencyGraph, build_documents, build_site},
    log,
    logger::WatchStatus,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{RecvTimeoutError, channel},
    time::{Duration, Instant},
};

// =============================================================================
// Constants
// =============================================================================

const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;
/// Idle poll interval, bounds how long Ctrl+C takes to stop the loop.
const IDLE_POLL_MS: u64 = 500;

// =============================================================================
// Categorization
// =============================================================================

/// Role of a changed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// `globals.toml`: reload and rebuild everything
    Config,
    /// File under the data root: rebuild its dependents
    Data,
    /// Document under the content directory: rebuild it
    Content,
    /// Anything else, including build output
    Unknown,
}

/// Categorize a changed path against the current config.
///
/// Output is checked before data so that a data root containing the output
/// directory never triggers on its own writes. Content and config under the
/// data root are not data.
pub fn categorize_path(path: &Path, config: &SiteConfig) -> FileCategory {
    if path == config.config_path {
        FileCategory::Config
    } else if path.starts_with(&config.build.output) {
        FileCategory::Unknown
    } else if path.starts_with(config.data_root())
        && !config
            .data_exclusions()
            .iter()
            .any(|excluded| path.starts_with(excluded))
    {
        FileCategory::Data
    } else if path.starts_with(&config.build.content) && config.is_document(path) {
        FileCategory::Content
    } else {
        FileCategory::Unknown
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// `/proj/data/team/members.json` → `data/team/members.json`
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Documents depending on any of `changed`.
///
/// Returns `None` when a changed data file has no recorded dependents.
fn collect_affected(graph: &DependencyGraph, changed: &[&PathBuf]) -> Option<Vec<PathBuf>> {
    let mut affected = FxHashSet::default();
    for path in changed {
        affected.extend(graph.get_dependents(path)?.iter().cloned());
    }
    let mut affected: Vec<_> = affected.into_iter().collect();
    affected.sort();
    Some(affected)
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_millis(IDLE_POLL_MS)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// What a batch of changes asks for.
#[derive(Debug, Default, PartialEq, Eq)]
struct Plan {
    config_changed: bool,
    data: Vec<PathBuf>,
    content: Vec<PathBuf>,
}

impl Plan {
    fn from_paths(paths: &[PathBuf], config: &SiteConfig) -> Self {
        let mut plan = Self::default();
        for path in paths {
            // Event paths may differ from the canonical config paths
            let path = SiteConfig::normalize_path(path);
            match categorize_path(&path, config) {
                FileCategory::Config => plan.config_changed = true,
                FileCategory::Data => plan.data.push(path),
                FileCategory::Content => plan.content.push(path),
                FileCategory::Unknown => {}
            }
        }
        plan
    }

    fn is_empty(&self) -> bool {
        !self.config_changed && self.data.is_empty() && self.content.is_empty()
    }
}

/// Outcome of handling one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handled {
    Nothing,
    Incremental,
    Full,
}

fn report(status: &mut WatchStatus, what: &str, result: Result<BuildReport>) {
    match result {
        Ok(report) if report.is_success() => {
            status.success(&format!("{what}: {} document(s) rebuilt", report.built));
        }
        Ok(report) => status.error(
            &format!("{what}: {} of {} document(s) failed", report.failed, report.built + report.failed),
            "",
        ),
        Err(err) => status.error(&format!("{what}: build failed"), &format!("{err:#}")),
    }
}

fn handle_changes(paths: &[PathBuf], status: &mut WatchStatus, cancel: &CancelFlag) -> Handled {
    apply_changes(
        paths,
        &cfg(),
        &DEPENDENCY_GRAPH,
        status,
        cancel,
        reload_config,
    )
}

/// Rebuild what `paths` affect.
///
/// `reload` replaces the global config and reports whether it changed. An
/// unchanged or unloadable config does not hide the data and content
/// changes of the same batch.
fn apply_changes(
    paths: &[PathBuf],
    config: &SiteConfig,
    graph: &RwLock<DependencyGraph>,
    status: &mut WatchStatus,
    cancel: &CancelFlag,
    reload: impl FnOnce() -> Result<bool>,
) -> Handled {
    let root = config.get_root();
    let plan = Plan::from_paths(paths, config);
    if plan.is_empty() {
        return Handled::Nothing;
    }

    if plan.config_changed {
        match reload() {
            Ok(true) => {
                let config = cfg();
                report(
                    status,
                    "config changed",
                    build_site(&config, graph, false, Some(cancel)),
                );
                return Handled::Full;
            }
            Ok(false) => {}
            Err(err) if plan.data.is_empty() && plan.content.is_empty() => {
                status.error("config reload failed", &format!("{err:#}"));
                return Handled::Nothing;
            }
            Err(err) => log!("watch"; "config reload failed, keeping previous: {err:#}"),
        }
    }

    let mut targets: Vec<PathBuf> = Vec::new();
    if !plan.data.is_empty() {
        let triggers: Vec<_> = plan.data.iter().collect();
        let affected = collect_affected(&graph.read(), &triggers);
        let trigger = rel_path(&plan.data[0], root);

        let Some(affected) = affected else {
            report(
                status,
                &format!("{trigger} changed (no deps cached)"),
                build_site(config, graph, false, Some(cancel)),
            );
            return Handled::Full;
        };
        log!("watch"; "{trigger} changed, {} affected document(s)", affected.len());
        targets.extend(affected);
    }

    for path in plan.content {
        if path.exists() {
            targets.push(path);
        } else {
            graph.write().remove_document(&path);
        }
    }

    targets.sort();
    targets.dedup();
    if targets.is_empty() {
        return Handled::Nothing;
    }

    let what = match targets.as_slice() {
        [single] => rel_path(single, root),
        _ => format!("{} documents", targets.len()),
    };
    report(
        status,
        &what,
        build_documents(&targets, config, graph, Some(cancel)),
    );
    Handled::Incremental
}

// =============================================================================
// Watcher Setup
// =============================================================================

type WatchTargets = Vec<(PathBuf, RecursiveMode)>;

/// Paths to watch, with recursion mode.
///
/// A path that does not exist yet is replaced by its nearest existing
/// ancestor, watched non-recursively, so its creation is still seen.
fn watch_targets(config: &SiteConfig) -> WatchTargets {
    let wanted = [
        (config.data_root().to_path_buf(), RecursiveMode::Recursive),
        (config.build.content.clone(), RecursiveMode::Recursive),
        (config.config_path.clone(), RecursiveMode::NonRecursive),
    ];
    let mut targets: WatchTargets = wanted
        .into_iter()
        .filter_map(|(path, mode)| {
            if path.exists() {
                return Some((path, mode));
            }
            path.ancestors()
                .skip(1)
                .find(|ancestor| ancestor.exists())
                .map(|ancestor| (ancestor.to_path_buf(), RecursiveMode::NonRecursive))
        })
        .collect();

    // A path inside a recursively watched directory is already covered.
    let dirs: Vec<_> = targets
        .iter()
        .filter(|(_, mode)| *mode == RecursiveMode::Recursive)
        .map(|(path, _)| path.clone())
        .collect();
    targets.retain(|(path, mode)| {
        !dirs.iter().any(|dir| {
            path.starts_with(dir) && (dir != path || *mode == RecursiveMode::NonRecursive)
        })
    });
    targets.sort_by(|a, b| a.0.cmp(&b.0));
    targets.dedup();
    targets
}

fn setup_watchers(watcher: &mut impl Watcher, config: &SiteConfig) -> Result<WatchTargets> {
    let root = config.get_root();
    let targets = watch_targets(config);

    for (path, mode) in &targets {
        watcher
            .watch(path, *mode)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        log!("watch"; "{}", rel_path(path, root));
    }

    Ok(targets)
}

/// Re-register watchers when the config or the set of existing paths changed.
fn refresh_watchers(watcher: &mut impl Watcher, watched: &mut WatchTargets) -> Result<()> {
    let config = cfg();
    if watch_targets(&config) == *watched {
        return Ok(());
    }
    for (path, _) in watched.drain(..) {
        // Path may be gone already
        let _ = watcher.unwatch(&path);
    }
    *watched = setup_watchers(watcher, &config)?;
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher. Returns once `shutdown` is raised.
pub fn watch_for_changes_blocking(shutdown: &CancelFlag) -> Result<()> {
    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    let mut watched = setup_watchers(&mut watcher, &cfg())?;

    let mut debouncer = Debouncer::new();
    let mut status = WatchStatus::new();

    while !shutdown.is_cancelled() {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) && !debouncer.in_cooldown() => {
                debouncer.add(event);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                let paths = debouncer.take();
                // A created data root or content dir needs a recursive watch
                refresh_watchers(&mut watcher, &mut watched)?;
                if handle_changes(&paths, &mut status, shutdown) == Handled::Full {
                    debouncer.mark_rebuild();
                }
                refresh_watchers(&mut watcher, &mut watched)?;
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}
