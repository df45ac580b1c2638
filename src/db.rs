//! SQLite connection management.
//!
//! A catalog is written by exactly one process at a time, so the pool holds
//! a single connection. Every connection runs with:
//!
//! - WAL journaling and `synchronous = FULL`, so each committed statement is
//!   durable before the call returns;
//! - foreign keys enforced, which is what makes `file_tag` rows cascade when
//!   a file or tag is deleted.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;

/// Open a pool on the database at `path`.
///
/// With `create == false` a missing file is an error instead of silently
/// producing an empty database.
pub async fn connect(path: &Path, create: bool) -> Result<SqlitePool, sqlx::Error> {
    if create {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}
