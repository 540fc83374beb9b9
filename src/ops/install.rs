//! Install coordinator: resolves dependencies including the proposed new
//! set, detects catalog-level file conflicts, commits or rolls back, then
//! copies files into the target tree.

use std::path::Path;

use crate::core::builder::BuildOutput;
use crate::core::manifest::EntryKind;
use crate::core::version::{self, check_all, PackageView};
use crate::fs::hash::hash_file;
use crate::ops::error::{FileConflict, LifecycleError};
use crate::policy::Policy;
use crate::store::catalog::{Catalog, CatalogFile};

/// Builds the "installed ∪ batch" view that dependency resolution runs
/// against: catalog rows first, each overridden by the corresponding
/// member of `batch` if present, so packages installed in the same batch
/// satisfy each other's dependencies.
fn installed_with_batch(
    catalog: &Catalog,
    batch: &[BuildOutput],
) -> Result<Vec<(String, PackageView)>, LifecycleError> {
    let mut view = Vec::new();

    for pkg in catalog.list("%")? {
        let parsed = PackageView {
            version: version::Version::parse(&pkg.version)?,
            deps: version::parse_deps(&pkg.deps)?,
        };
        view.push((pkg.name, parsed));
    }

    for b in batch {
        let entry = PackageView {
            version: b.manifest.version.clone(),
            deps: b.manifest.deps.clone(),
        };
        if let Some(slot) = view.iter_mut().find(|(n, _)| *n == b.manifest.name) {
            slot.1 = entry;
        } else {
            view.push((b.manifest.name.clone(), entry));
        }
    }

    Ok(view)
}

/// Installs a batch of built packages into `root` (the installation root).
pub fn install(
    catalog: &mut Catalog,
    root: &Path,
    batch: Vec<BuildOutput>,
    policy: &Policy,
) -> Result<(), LifecycleError> {
    // Step 1: dependency check-with.
    let view = installed_with_batch(catalog, &batch)?;
    let failures: Vec<_> = check_all(&view).collect();
    if !failures.is_empty() {
        if policy.no_deps {
            for (offender, dep) in &failures {
                tracing::warn!(offender, %dep, "unmet dependency, proceeding under no_deps");
            }
        } else {
            return Err(LifecycleError::UnmetDependencies(failures));
        }
    }

    // Step 2: begin transaction.
    let txn = catalog.begin()?;
    let mut conflicts = Vec::new();

    // Step 3: insert packages and files in batch order.
    for b in &batch {
        if txn.package_exists(&b.manifest.name)? {
            tracing::warn!(package = %b.manifest.name, "already installed, replacing catalog rows");
            txn.delete_package(&b.manifest.name)?;
        }
        txn.insert_package(&b.manifest)?;

        for entry in &b.files {
            let hash = match entry.kind {
                EntryKind::Dir => String::new(),
                EntryKind::File => hash_file(&b.scratch_dir.join(&entry.relative_path))
                    .map_err(|e| LifecycleError::Io(std::io::Error::other(e.to_string())))?,
            };

            let file = CatalogFile {
                owner_package: b.manifest.name.clone(),
                hash,
                path: entry.relative_path.clone(),
                kind: entry.kind,
                permissions: entry.permissions,
            };

            if let Err(crate::store::catalog::CatalogError::PathConflict(path)) =
                txn.insert_file(&file)
            {
                if entry.kind == EntryKind::File {
                    conflicts.push((b.manifest.name.clone(), path));
                }
                // Directory conflicts are silently ignored.
            }
        }
    }

    // Step 4: on conflict, look up owners, roll back, fail.
    if !conflicts.is_empty() {
        let mut reported = Vec::with_capacity(conflicts.len());
        for (package, path) in conflicts {
            let existing_owner = txn.file_owner(&path)?;
            reported.push(FileConflict {
                package,
                path,
                existing_owner,
            });
        }
        txn.rollback()?;
        return Err(LifecycleError::FileConflict(reported));
    }

    // Step 5: commit.
    txn.commit()?;

    // Step 6: materialize. Copy failures after commit are logged, not fatal;
    // the catalog has already committed, so rolling back here would leave it
    // disagreeing with what's actually on disk.
    for b in &batch {
        materialize(root, &b.scratch_dir, &b.files);
        if let Err(e) = std::fs::remove_dir_all(&b.scratch_dir) {
            tracing::warn!(scratch_dir = %b.scratch_dir.display(), error = %e, "failed to remove scratch directory");
        }
    }

    Ok(())
}

fn materialize(root: &Path, scratch_dir: &Path, files: &[crate::core::manifest::FileEntry]) {
    let mut dirs: Vec<_> = files.iter().filter(|f| f.kind == EntryKind::Dir).collect();
    dirs.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    for d in dirs {
        let dest = root.join(&d.relative_path);
        if let Err(e) = std::fs::create_dir_all(&dest) {
            tracing::warn!(path = %dest.display(), error = %e, "failed to create directory");
        }
    }

    let mut plain_files: Vec<_> = files.iter().filter(|f| f.kind == EntryKind::File).collect();
    plain_files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    for f in plain_files {
        let src = scratch_dir.join(&f.relative_path);
        let dest = root.join(&f.relative_path);
        if let Some(parent) = dest.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::copy(&src, &dest) {
            tracing::warn!(path = %dest.display(), error = %e, "failed to materialize file");
            continue;
        }
        apply_permissions(&dest, f.permissions);
    }
}

/// Applies the recorded POSIX permissions to a materialized file. Absence
/// of permissions (non-Unix snapshot, or none recorded) is a no-op.
#[cfg(unix)]
fn apply_permissions(path: &Path, permissions: Option<u32>) {
    use std::os::unix::fs::PermissionsExt;
    let Some(mode) = permissions else { return };
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)) {
        tracing::warn!(path = %path.display(), error = %e, "failed to apply permissions");
    }
}

#[cfg(not(unix))]
fn apply_permissions(_path: &Path, _permissions: Option<u32>) {}
