//! Content hashing. MD5 is used purely as a tamper-evidence fingerprint
//! against accidental local modification; it is not a security primitive
//! and no part of this crate treats it as one.

use std::io;
use std::path::Path;

use md5::{Digest, Md5};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to hash {path}: {source}")]
pub struct HashError {
    path: String,
    #[source]
    source: io::Error,
}

/// Hashes the full content of `path` with MD5, returning a 32-character
/// lowercase hex string.
pub fn hash_file(path: &Path) -> Result<String, HashError> {
    let bytes = std::fs::read(path).map_err(|source| HashError {
        path: path.display().to_string(),
        source,
    })?;
    let mut hasher = Md5::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Returns `true` when `path`'s current content hashes to `expected`.
pub fn hash_matches(path: &Path, expected: &str) -> Result<bool, HashError> {
    Ok(hash_file(path)? == expected)
}
