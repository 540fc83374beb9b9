//! Domain errors for the install and uninstall coordinators.

use thiserror::Error;

use crate::core::builder::BuildError;
use crate::core::manifest::ManifestError;
use crate::core::version::{AggregateParseError, Dependency, ParseError};
use crate::store::catalog::CatalogError;

/// One conflicting file entry for a [`LifecycleError::FileConflict`]:
/// the package that tried to claim `path`, and the package that already
/// owns it (looked up after the conflict was detected).
#[derive(Debug, Clone)]
pub struct FileConflict {
    pub package: String,
    pub path: String,
    pub existing_owner: Option<String>,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("malformed dependency string: {0}")]
    DependencyParse(#[from] AggregateParseError),

    #[error("malformed version string: {0}")]
    VersionParse(#[from] ParseError),

    #[error("invalid manifest: {0}")]
    InvalidManifest(#[from] ManifestError),

    #[error("package script failed: {0}")]
    Build(#[from] BuildError),

    #[error("unmet dependencies: {0:?}")]
    UnmetDependencies(Vec<(String, Dependency)>),

    #[error("file conflicts: {0:?}")]
    FileConflict(Vec<FileConflict>),

    #[error("package not installed: {0}")]
    NotInstalled(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
