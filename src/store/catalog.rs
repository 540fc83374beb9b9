//! The catalog store: a relational record of installed packages and the
//! files they own, backed by SQLite. No schema migration is supported;
//! this is schema version 1, and it is the only one.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::core::manifest::{EntryKind, Manifest};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog I/O error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// `insert_file` hit the UNIQUE(path) constraint. Callers that are
    /// processing a batch (the install coordinator) catch this variant
    /// specifically and keep going; it is the sole conflict-detection
    /// mechanism the catalog provides.
    #[error("path already owned by another package: {0}")]
    PathConflict(String),
}

/// A package row as stored: strings in, strings out. Parsing a `version`
/// or `deps` field into the algebra's types happens on read, by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPackage {
    pub name: String,
    pub version: String,
    pub maintainer: String,
    pub deps: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFile {
    pub owner_package: String,
    pub hash: String,
    pub path: String,
    pub kind: EntryKind,
    pub permissions: Option<u32>,
}

fn kind_to_str(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::File => "file",
        EntryKind::Dir => "dir",
    }
}

fn kind_from_str(s: &str) -> EntryKind {
    if s == "dir" {
        EntryKind::Dir
    } else {
        EntryKind::File
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS packages (
        name        TEXT PRIMARY KEY,
        version     TEXT NOT NULL,
        maintainer  TEXT NOT NULL,
        deps        TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS files (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_package TEXT NOT NULL REFERENCES packages(name) ON DELETE CASCADE,
        hash          TEXT NOT NULL,
        path          TEXT NOT NULL UNIQUE,
        kind          TEXT NOT NULL,
        permissions   INTEGER
    );
";

/// The catalog store. Wraps a single SQLite connection; the engine assumes
/// exclusive access to the catalog file for the duration of an operation.
/// No advisory locking is attempted.
#[derive(Debug)]
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Opens (creating if absent) the catalog at `path`, creating the two
    /// tables if they don't exist yet. Idempotent.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// An in-memory catalog, used by tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn package_info(&self, name: &str) -> Result<Option<CatalogPackage>, CatalogError> {
        self.conn
            .query_row(
                "SELECT name, version, maintainer, deps FROM packages WHERE name = ?1",
                params![name],
                |row| {
                    Ok(CatalogPackage {
                        name: row.get(0)?,
                        version: row.get(1)?,
                        maintainer: row.get(2)?,
                        deps: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(CatalogError::from)
    }

    pub fn file_owner(&self, path: &str) -> Result<Option<String>, CatalogError> {
        self.conn
            .query_row(
                "SELECT owner_package FROM files WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()
            .map_err(CatalogError::from)
    }

    pub fn list_package_files(&self, name: &str) -> Result<Vec<CatalogFile>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT owner_package, hash, path, kind, permissions FROM files WHERE owner_package = ?1",
        )?;
        let rows = stmt
            .query_map(params![name], |row| {
                let kind: String = row.get(3)?;
                Ok(CatalogFile {
                    owner_package: row.get(0)?,
                    hash: row.get(1)?,
                    path: row.get(2)?,
                    kind: kind_from_str(&kind),
                    permissions: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Lists packages whose name matches `name_pattern`, a SQL-`LIKE`
    /// pattern (`%`/`_` wildcards).
    pub fn list(&self, name_pattern: &str) -> Result<Vec<CatalogPackage>, CatalogError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, version, maintainer, deps FROM packages WHERE name LIKE ?1 ORDER BY name")?;
        let rows = stmt
            .query_map(params![name_pattern], |row| {
                Ok(CatalogPackage {
                    name: row.get(0)?,
                    version: row.get(1)?,
                    maintainer: row.get(2)?,
                    deps: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Begins a transaction covering one install batch.
    pub fn begin(&mut self) -> Result<CatalogTxn<'_>, CatalogError> {
        let tx = self.conn.transaction()?;
        Ok(CatalogTxn { tx })
    }

    /// Deletes a package row and all its file rows as a single atomic
    /// transaction, returning the file rows that were removed so the
    /// caller can act on disk afterward. Errors if the package has no row
    /// (callers are expected to have already checked `package_info`).
    pub fn remove_package_atomic(
        &mut self,
        name: &str,
    ) -> Result<Vec<CatalogFile>, CatalogError> {
        let tx = self.conn.transaction()?;
        let files = {
            let mut stmt = tx.prepare(
                "SELECT owner_package, hash, path, kind, permissions FROM files WHERE owner_package = ?1",
            )?;
            stmt.query_map(params![name], |row| {
                let kind: String = row.get(3)?;
                Ok(CatalogFile {
                    owner_package: row.get(0)?,
                    hash: row.get(1)?,
                    path: row.get(2)?,
                    kind: kind_from_str(&kind),
                    permissions: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?
        };
        tx.execute("DELETE FROM files WHERE owner_package = ?1", params![name])?;
        tx.execute("DELETE FROM packages WHERE name = ?1", params![name])?;
        tx.commit()?;
        Ok(files)
    }
}

/// A single install-batch transaction. Every mutation goes
/// through this handle; the caller decides `commit` vs `rollback`, and the
/// underlying `rusqlite::Transaction` rolls back automatically if dropped
/// without either (guaranteed release on all exit paths, including panics
/// unwinding through `?`).
pub struct CatalogTxn<'c> {
    tx: rusqlite::Transaction<'c>,
}

impl CatalogTxn<'_> {
    pub fn package_exists(&self, name: &str) -> Result<bool, CatalogError> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM packages WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Deletes a package's rows within the current transaction, used by the
    /// install coordinator's "already installed" path: the stale rows are
    /// deleted before reinserting rather than silently duplicating or
    /// failing.
    pub fn delete_package(&self, name: &str) -> Result<(), CatalogError> {
        self.tx
            .execute("DELETE FROM files WHERE owner_package = ?1", params![name])?;
        self.tx
            .execute("DELETE FROM packages WHERE name = ?1", params![name])?;
        Ok(())
    }

    pub fn insert_package(&self, manifest: &Manifest) -> Result<(), CatalogError> {
        self.tx.execute(
            "INSERT INTO packages (name, version, maintainer, deps) VALUES (?1, ?2, ?3, ?4)",
            params![
                manifest.name,
                manifest.version.to_string(),
                manifest.maintainer,
                manifest
                    .deps
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            ],
        )?;
        Ok(())
    }

    /// Attempts to register ownership of `file.path`. Returns
    /// `Err(PathConflict)`, and nothing else, when the UNIQUE(path)
    /// constraint rejects the insert; every other SQLite failure surfaces
    /// as `Err(Sqlite)`. The install coordinator treats only the former as
    /// expected and keeps processing the remaining files.
    pub fn insert_file(&self, file: &CatalogFile) -> Result<(), CatalogError> {
        let result = self.tx.execute(
            "INSERT INTO files (owner_package, hash, path, kind, permissions) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                file.owner_package,
                file.hash,
                file.path,
                kind_to_str(file.kind),
                file.permissions,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(CatalogError::PathConflict(file.path.clone())),
            Err(e) => Err(CatalogError::from(e)),
        }
    }

    pub fn file_owner(&self, path: &str) -> Result<Option<String>, CatalogError> {
        self.tx
            .query_row(
                "SELECT owner_package FROM files WHERE path = ?1",
                params![path],
                |row| row.get(0),
            )
            .optional()
            .map_err(CatalogError::from)
    }

    pub fn commit(self) -> Result<(), CatalogError> {
        self.tx.commit()?;
        Ok(())
    }

    pub fn rollback(self) -> Result<(), CatalogError> {
        self.tx.rollback()?;
        Ok(())
    }
}
