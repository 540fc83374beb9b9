//! pallet - a small, file-based package manager.
//!
//! The library crate exposes the package lifecycle engine: version and
//! dependency algebra, the catalog store, filesystem snapshotting and
//! integrity, the package builder, and the install/uninstall coordinators.
//! `main.rs`/`cmd/*` are a thin CLI shell around it.

pub mod core;
pub mod fs;
pub mod ops;
pub mod policy;
pub mod store;

use std::path::PathBuf;

use dirs::home_dir;

/// Returns the primary configuration directory, or `None` if the user's
/// home cannot be resolved. Honors `PALLET_HOME` as an override.
pub fn try_pallet_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("PALLET_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".pallet"))
}

/// The canonical pallet home directory (`~/.pallet`).
///
/// # Panics
/// Panics if neither `PALLET_HOME` is set nor the user's home directory can
/// be resolved.
pub fn pallet_home() -> PathBuf {
    try_pallet_home().expect("could not determine home directory; set PALLET_HOME to override")
}

/// Default catalog path: `~/.pallet/catalog.db`. Overridden by `--db` or the
/// `PALLET_DB` environment variable at the CLI layer.
pub fn default_db_path() -> PathBuf {
    pallet_home().join("catalog.db")
}
