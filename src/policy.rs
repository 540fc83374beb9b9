//! Policy configuration: process-wide flags steering conflict, dependency,
//! and removal behavior. Built once at CLI startup and passed by reference
//! into the ops layer; the core treats it as opaque and read-only.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Policy {
    /// Skip the fatal on failed dependency checks in install/remove.
    pub no_deps: bool,
    /// Allow removal of modified files via rename-to-temp backup.
    pub hard_remove: bool,
    /// Reserved; intended to bypass file conflicts. Not implemented.
    pub force: bool,
    /// Include full error chains in CLI error reporting.
    pub debug: bool,
    /// Filesystem path to the catalog store.
    pub db: PathBuf,
}

impl Policy {
    pub fn new(db: PathBuf) -> Self {
        Self {
            no_deps: false,
            hard_remove: false,
            force: false,
            debug: false,
            db,
        }
    }
}
