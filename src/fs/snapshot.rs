//! Recursive directory enumeration.

use std::path::Path;

use thiserror::Error;
use walkdir::WalkDir;

use crate::core::manifest::{EntryKind, FileEntry};

#[derive(Debug, Error)]
#[error("failed to walk {path}: {source}")]
pub struct SnapshotError {
    path: String,
    #[source]
    source: walkdir::Error,
}

/// Walks `root` recursively, yielding one [`FileEntry`] per descendant
/// (the root itself is not emitted). `relative_path` is always expressed
/// relative to `root` with forward-slash separators and no leading `./`.
/// Traversal order is unspecified; callers that need a deterministic order
/// sort the result themselves (materialization and removal both do).
pub fn snapshot(root: &Path) -> Result<Vec<FileEntry>, SnapshotError> {
    let mut entries = Vec::new();

    for dirent in WalkDir::new(root).min_depth(1) {
        let dirent = dirent.map_err(|source| SnapshotError {
            path: root.display().to_string(),
            source,
        })?;

        let relative = dirent
            .path()
            .strip_prefix(root)
            .unwrap_or(dirent.path())
            .to_string_lossy()
            .replace('\\', "/");

        let kind = if dirent.file_type().is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };

        let permissions = posix_permissions(dirent.path());

        entries.push(FileEntry {
            relative_path: relative,
            kind,
            permissions,
        });
    }

    Ok(entries)
}

#[cfg(unix)]
fn posix_permissions(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::symlink_metadata(path)
        .ok()
        .map(|m| m.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn posix_permissions(_path: &Path) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn snapshot_yields_relative_paths_without_leading_dot_slash() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("file"), b"hi").unwrap();
        fs::create_dir(dir.path().join("testdir")).unwrap();
        fs::write(dir.path().join("testdir/file2"), b"there").unwrap();

        let mut entries = snapshot(dir.path()).unwrap();
        entries.sort();

        let paths: Vec<_> = entries.iter().map(|e| e.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["file", "testdir", "testdir/file2"]);
        assert!(!paths.iter().any(|p| p.starts_with("./")));

        let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds[0], EntryKind::File);
        assert_eq!(kinds[1], EntryKind::Dir);
        assert_eq!(kinds[2], EntryKind::File);
    }

    #[test]
    fn empty_directory_yields_no_entries() {
        let dir = tempfile::tempdir().unwrap();
        assert!(snapshot(dir.path()).unwrap().is_empty());
    }
}
