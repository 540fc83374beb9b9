//! The package manifest and file-entry types, plus the manifest validation
//! rule the builder applies to a script's output.

use serde::Deserialize;
use thiserror::Error;

use super::version::{self, Dependency, ParseError, Version};

/// The literal TOML shape a package script writes to its standard output.
/// Every field is a bare string; `deps` is parsed separately so a malformed
/// dependency string surfaces as [`ManifestError::Dependencies`] rather than
/// a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct RawManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub maintainer: Option<String>,
    pub deps: Option<String>,
}

/// A validated package manifest: name, version, maintainer, and parsed
/// dependency list, in that order as declared in the data model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub version: Version,
    pub maintainer: String,
    pub deps: Vec<Dependency>,
}

/// One entry produced by the filesystem snapshot or replayed from a
/// catalog row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileEntry {
    pub relative_path: String,
    pub kind: EntryKind,
    pub permissions: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest is missing required field {0:?}")]
    MissingField(&'static str),
    #[error("manifest name {0:?} contains characters outside [a-zA-Z0-9_-]")]
    InvalidName(String),
    #[error("manifest version is invalid: {0}")]
    Version(#[from] ParseError),
    #[error("manifest dependency string is invalid: {0}")]
    Dependencies(#[from] version::AggregateParseError),
}

/// Package names are restricted to alphanumerics, hyphen, and underscore.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl Manifest {
    /// Validates a raw manifest: all four fields present, `deps` parsed as
    /// a dependency string (an empty string parses to no dependencies).
    pub fn from_raw(raw: RawManifest) -> Result<Self, ManifestError> {
        let name = raw.name.ok_or(ManifestError::MissingField("name"))?;
        let version = raw.version.ok_or(ManifestError::MissingField("version"))?;
        let maintainer = raw
            .maintainer
            .ok_or(ManifestError::MissingField("maintainer"))?;
        let deps = raw.deps.ok_or(ManifestError::MissingField("deps"))?;

        if !is_valid_name(&name) {
            return Err(ManifestError::InvalidName(name));
        }

        let version = Version::parse(&version)?;
        let deps = version::parse_deps(&deps)?;

        Ok(Self {
            name,
            version,
            maintainer,
            deps,
        })
    }
}
