//! Uninstall coordinator: checks that removal does not break remaining
//! dependencies, removes files only when their hash still matches (with a
//! hard-override policy), then removes catalog rows.

use std::path::Path;

use crate::core::version::{self, check_all, PackageView};
use crate::fs::hash::hash_matches;
use crate::ops::error::LifecycleError;
use crate::policy::Policy;
use crate::store::catalog::{Catalog, CatalogFile};

/// Builds the "installed minus removed" view that dependency resolution
/// runs against: every catalog row except the ones named in `targets`.
fn installed_without(catalog: &Catalog, targets: &[String]) -> Result<Vec<(String, PackageView)>, LifecycleError> {
    let mut view = Vec::new();
    for pkg in catalog.list("%")? {
        if targets.iter().any(|t| *t == pkg.name) {
            continue;
        }
        view.push((
            pkg.name,
            PackageView {
                version: version::Version::parse(&pkg.version)?,
                deps: version::parse_deps(&pkg.deps)?,
            },
        ));
    }
    Ok(view)
}

/// Removes the named packages from `root` (the installation root).
pub fn remove(
    catalog: &mut Catalog,
    root: &Path,
    targets: &[String],
    policy: &Policy,
) -> Result<(), LifecycleError> {
    // Step 1: every target must exist.
    for name in targets {
        if catalog.package_info(name)?.is_none() {
            return Err(LifecycleError::NotInstalled(name.clone()));
        }
    }

    // Step 2: dependency check-without.
    let view = installed_without(catalog, targets)?;
    let failures: Vec<_> = check_all(&view).collect();
    if !failures.is_empty() {
        if policy.no_deps {
            for (offender, dep) in &failures {
                tracing::warn!(offender, %dep, "unmet dependency after removal, proceeding under no_deps");
            }
        } else {
            return Err(LifecycleError::UnmetDependencies(failures));
        }
    }

    // Step 3: per-package atomic catalog deletion, then disk removal.
    for name in targets {
        let files = catalog.remove_package_atomic(name)?;
        remove_from_disk(root, &files, policy);
    }

    Ok(())
}

/// Removes files, then directories, both sorted by path descending
/// (deepest first). Files are hash-verified before removal; directories
/// are best-effort and failures are ignored (they may be shared with
/// untracked content).
fn remove_from_disk(root: &Path, files: &[CatalogFile], policy: &Policy) {
    use crate::core::manifest::EntryKind;

    let mut file_rows: Vec<_> = files.iter().filter(|f| f.kind == EntryKind::File).collect();
    file_rows.sort_by(|a, b| b.path.cmp(&a.path));

    for row in file_rows {
        let path = root.join(&row.path);
        match hash_matches(&path, &row.hash) {
            Ok(true) => {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove file");
                }
            }
            Ok(false) => {
                if policy.hard_remove {
                    let mut backup = path.clone().into_os_string();
                    backup.push(format!(".bak-{}", std::process::id()));
                    let backup = std::path::PathBuf::from(backup);
                    if let Err(e) = std::fs::rename(&path, &backup) {
                        tracing::warn!(path = %path.display(), error = %e, "failed to back up modified file");
                    } else {
                        tracing::warn!(path = %path.display(), backup = %backup.display(), "modified file backed up and removed");
                    }
                } else {
                    tracing::warn!(path = %path.display(), "modified file retained, refusing to remove");
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to hash file during removal");
            }
        }
    }

    let mut dir_rows: Vec<_> = files.iter().filter(|f| f.kind == EntryKind::Dir).collect();
    dir_rows.sort_by(|a, b| b.path.cmp(&a.path));

    for row in dir_rows {
        let path = root.join(&row.path);
        // Not empty, already gone, or otherwise unremovable: all ignored.
        // Directories created during install may be shared with untracked
        // content.
        let _ = std::fs::remove_dir(&path);
    }
}
