//! Filesystem snapshot and content integrity.

pub mod hash;
pub mod snapshot;

pub use hash::{hash_file, hash_matches, HashError};
pub use snapshot::snapshot;
