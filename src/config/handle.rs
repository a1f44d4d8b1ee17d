//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement.
//! This enables hot-reloading of `globals.toml` during watch mode.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CONFIG (ArcSwap)                         │
//! │                                                             │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────┐    │
//! │  │  Reader 1   │     │  Reader 2   │     │   Writer    │    │
//! │  │  (rayon)    │     │  (rayon)    │     │  (watch)    │    │
//! │  └──────┬──────┘     └──────┬──────┘     └──────┬──────┘    │
//! │         │                   │                   │           │
//! │         ▼                   ▼                   ▼           │
//! │       cfg()              cfg()           reload_config()    │
//! │    (lock-free)         (lock-free)      (atomic replace)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use super::{ConfigError, SiteConfig};
use anyhow::Result;
use arc_swap::ArcSwap;
use std::{
    fs,
    path::Path,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicU64, Ordering},
    },
};

// =============================================================================
// Global State
// =============================================================================

/// Global config storage with atomic replacement support.
///
/// Initialized with default config, then replaced with the loaded one in main.
pub static CONFIG: LazyLock<ArcSwap<SiteConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(SiteConfig::default()));

/// Hash of the config file content of the last successful load.
/// Zero when there was no file.
static CONFIG_HASH: AtomicU64 = AtomicU64::new(0);

// =============================================================================
// Public API
// =============================================================================

/// Get current config as `Arc<SiteConfig>`.
///
/// Lock-free read via atomic load. Suitable for rayon workers.
#[inline]
pub fn cfg() -> Arc<SiteConfig> {
    CONFIG.load_full()
}

/// Initialize global config (called once at startup).
pub fn init_config(config: SiteConfig) {
    CONFIG_HASH.store(file_hash(&config.config_path), Ordering::Relaxed);
    CONFIG.store(Arc::new(config));
}

/// Replace config atomically when `globals.toml` changes.
///
/// Returns `false` if the content matches the last load. On a parse or
/// validation error the previous config stays in place.
pub fn reload_config() -> Result<bool> {
    let c = cfg();
    let Some(cli) = c.cli else {
        return Err(ConfigError::Validation("config was not initialized from CLI".into()).into());
    };

    let new_hash = file_hash(&c.config_path);
    if new_hash == CONFIG_HASH.load(Ordering::Relaxed) {
        return Ok(false);
    }

    let new_config = SiteConfig::load(cli)?;
    CONFIG.store(Arc::new(new_config));
    CONFIG_HASH.store(new_hash, Ordering::Relaxed);

    Ok(true)
}

// =============================================================================
// Helpers
// =============================================================================

fn file_hash(path: &Path) -> u64 {
    fs::read(path).map_or(0, |content| compute(&content))
}

/// First eight bytes of the blake3 digest.
fn compute(content: &[u8]) -> u64 {
    let hash = blake3::hash(content);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
