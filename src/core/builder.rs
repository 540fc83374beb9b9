//! The package builder: evaluates an external package script in a scratch
//! directory and captures the resulting manifest and file list.
//!
//! A package script is a zero-argument callable that produces files under
//! the working directory and returns a manifest record. This crate
//! realizes it as an executable shell script, invoked as a child process
//! with its *working directory* set to the scratch directory; there is no
//! literal process-wide `chdir`, so restoring the prior working directory
//! afterward is a no-op by construction.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::core::manifest::{FileEntry, Manifest, ManifestError, RawManifest};
use crate::fs::snapshot::{self, SnapshotError};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to prepare scratch directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("package script {path} failed: {detail}")]
    ScriptFailed { path: PathBuf, detail: String },

    #[error("package script produced an invalid manifest: {0}")]
    InvalidManifest(#[from] ManifestError),

    #[error("package script manifest is not valid TOML: {0}")]
    ManifestSyntax(#[from] toml::de::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// The outcome of [`build`]: the validated manifest, the scratch directory
/// it ran in (left on disk; the install coordinator materializes from it
/// and is responsible for removing it afterward), and the snapshot of
/// files the script produced.
#[derive(Debug)]
pub struct BuildOutput {
    pub manifest: Manifest,
    pub scratch_dir: PathBuf,
    pub files: Vec<FileEntry>,
}

/// Runs `script_path` in a fresh scratch directory and captures its
/// manifest and produced files.
pub fn build(script_path: &Path) -> Result<BuildOutput, BuildError> {
    let scratch_dir = tempfile::Builder::new()
        .prefix("pallet-scratch-")
        .tempdir()?
        .into_path();

    let script_name = script_path
        .file_name()
        .map_or_else(|| PathBuf::from("script"), PathBuf::from);
    let script_copy = scratch_dir.join(&script_name);
    std::fs::copy(script_path, &script_copy)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&script_copy)?.permissions();
        perms.set_mode(perms.mode() | 0o100);
        std::fs::set_permissions(&script_copy, perms)?;
    }

    let output = Command::new("/bin/sh")
        .arg(&script_copy)
        .current_dir(&scratch_dir)
        .output()?;

    if !output.status.success() {
        return Err(BuildError::ScriptFailed {
            path: script_path.to_path_buf(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    // Step 4: delete the script copy before snapshotting, so it never
    // appears as a payload file.
    std::fs::remove_file(&script_copy)?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let raw: RawManifest = toml::from_str(&stdout)?;
    let manifest = Manifest::from_raw(raw)?;

    let files = snapshot::snapshot(&scratch_dir)?;

    Ok(BuildOutput {
        manifest,
        scratch_dir,
        files,
    })
}
