//! Error types for TaggerDB.
//!
//! Errors are grouped by where they are detected:
//!
//! - [`ConfigError`] — preconditions checked before the catalog is touched
//!   (missing or pre-existing catalog file, missing storage directory).
//! - [`CatalogError`] — connection state, schema compatibility, and storage
//!   layer faults raised by the catalog store.
//! - [`ScanError`] — everything that can stop a scan, including unreadable
//!   files.
//!
//! The CLI converts all of them into `anyhow::Error` at the boundary and
//! exits non-zero.

use std::path::PathBuf;
use thiserror::Error;

/// Preconditions that fail before any catalog mutation happens.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("catalog already exists at {0}")]
    CatalogExists(PathBuf),

    #[error("catalog not found at {0} (run `taggerdb init` first)")]
    CatalogMissing(PathBuf),

    #[error("storage directory does not exist: {0}")]
    StorageMissing(PathBuf),

    #[error("storage path is not a directory: {0}")]
    StorageNotDirectory(PathBuf),

    #[error("no storage directory given (use --directory or set scan.root)")]
    StorageUnset,

    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Faults raised by the catalog store.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog was closed, or never opened.
    #[error("catalog is not connected")]
    NotConnected,

    #[error("incompatible catalog schema: {0}")]
    IncompatibleSchema(String),

    /// A uniqueness or foreign key constraint fired at the storage layer.
    /// Callers are expected to prevent these with find-before-insert, so
    /// hitting one means the catalog and its caller disagree.
    #[error("catalog integrity violation: {0}")]
    Integrity(String),

    #[error("tag name must not be empty")]
    InvalidTagName,

    #[error("no catalogued file at '{0}'")]
    FileNotFound(String),

    #[error("unknown tag '{0}'")]
    TagNotFound(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db)
                if db.is_unique_violation() || db.is_foreign_key_violation() =>
            {
                CatalogError::Integrity(db.message().to_string())
            }
            sqlx::Error::PoolClosed => CatalogError::NotConnected,
            _ => CatalogError::Database(err),
        }
    }
}

/// Anything that aborts a scan.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk storage tree: {0}")]
    Walk(#[from] walkdir::Error),
}
