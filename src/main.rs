//! tola-globals - merge global data files with document front matter.

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::Value;
use tola_globals::{
    cli::{Cli, Commands},
    config::{SiteConfig, cfg, init_config},
    data::CancelFlag,
    host::{DEPENDENCY_GRAPH, build_site},
    log,
    watch::watch_for_changes_blocking,
};

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    init_config(SiteConfig::load(cli)?);

    match &cli.command {
        Commands::Build { build_args } => build_all(build_args.clean, None),
        Commands::Data { key } => print_data(key.as_deref()),
        Commands::Watch { build_args } => watch(build_args.clean),
    }
}

/// Build every document, failing when any document failed.
fn build_all(clean: bool, cancel: Option<&CancelFlag>) -> Result<()> {
    let config = cfg();
    let report = build_site(&config, &DEPENDENCY_GRAPH, clean, cancel)?;

    if !report.is_success() {
        bail!("{} of {} document(s) failed", report.failed, report.built + report.failed);
    }
    log!("build"; "{} document(s) -> {}", report.built, config.build.output.display());
    Ok(())
}

/// Print the namespace, or the value at `key`, as indented JSON.
fn print_data(key: Option<&str>) -> Result<()> {
    let config = cfg();
    let namespace = config
        .asset()
        .globals(None)
        .with_context(|| format!("Failed to load data from {}", config.data_root().display()))?;

    let value = match key {
        Some(key) => lookup(&namespace.value, key)
            .with_context(|| format!("no global data at `{key}`"))?,
        None => &namespace.value,
    };

    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolve a dotted path (`team.members`) or a JSON pointer (`/team/a.b`).
///
/// Pointers address keys that contain dots themselves.
fn lookup<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    if key.starts_with('/') {
        return value.pointer(key);
    }
    key.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |value, segment| match value {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
            _ => value.get(segment),
        })
}

/// Initial build, then rebuild on changes until Ctrl+C.
fn watch(clean: bool) -> Result<()> {
    let shutdown = CancelFlag::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        log!("watch"; "shutting down...");
        signal.cancel();
    })
    .context("Failed to set Ctrl+C handler")?;

    if let Err(err) = build_all(clean, Some(&shutdown)) {
        log!("error"; "{err:#}");
    }
    watch_for_changes_blocking(&shutdown)
}
