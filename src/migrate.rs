//! Catalog schema.
//!
//! Three relations: `file`, `tag`, and the `file_tag` association. Creation
//! is idempotent (`IF NOT EXISTS` throughout); the schema version lives in
//! `PRAGMA user_version` so a catalog written by an incompatible layout is
//! refused instead of being silently extended.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{CatalogError, ConfigError};

/// Version written to `PRAGMA user_version` by [`initialize`].
pub const SCHEMA_VERSION: i64 = 1;

/// Table names used by other, incompatible catalog layouts.
const FOREIGN_LAYOUT_TABLES: &[&str] = &["files", "tags", "file_tags", "tag_x_file"];

const CREATE_FILE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS file (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    location TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    size INTEGER NOT NULL CHECK (size >= 0),
    UNIQUE (sha256, size)
)
"#;

const CREATE_TAG_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tag (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT
)
"#;

const CREATE_FILE_TAG_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS file_tag (
    file_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (file_id, tag_id),
    FOREIGN KEY (file_id) REFERENCES file(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tag(id) ON DELETE CASCADE
)
"#;

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_file_location ON file(location)",
    "CREATE INDEX IF NOT EXISTS idx_file_tag_tag_id ON file_tag(tag_id)",
];

/// Create the catalog relations if they are absent.
///
/// Safe to run against an existing catalog of the current version. Fails
/// with [`CatalogError::IncompatibleSchema`] if the database carries a
/// different schema version or tables from another layout.
pub async fn initialize(pool: &SqlitePool) -> Result<(), CatalogError> {
    let version = schema_version(pool).await?;
    if version != 0 && version != SCHEMA_VERSION {
        return Err(CatalogError::IncompatibleSchema(format!(
            "found version {}, expected {}",
            version, SCHEMA_VERSION
        )));
    }

    for table in FOREIGN_LAYOUT_TABLES {
        let found: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(*table)
        .fetch_one(pool)
        .await?;
        if found > 0 {
            return Err(CatalogError::IncompatibleSchema(format!(
                "unsupported table '{}' present",
                table
            )));
        }
    }

    let mut tx = pool.begin().await?;
    sqlx::query(CREATE_FILE_TABLE).execute(&mut *tx).await?;
    sqlx::query(CREATE_TAG_TABLE).execute(&mut *tx).await?;
    sqlx::query(CREATE_FILE_TAG_TABLE).execute(&mut *tx).await?;
    for stmt in CREATE_INDEXES {
        sqlx::query(stmt).execute(&mut *tx).await?;
    }
    // PRAGMA does not accept bound parameters.
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::debug!(version = SCHEMA_VERSION, "catalog schema ready");
    Ok(())
}

/// Read `PRAGMA user_version`; 0 means no schema has been written yet.
pub async fn schema_version(pool: &SqlitePool) -> Result<i64, CatalogError> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

/// CLI entry point for `taggerdb init`.
///
/// Refuses to touch a path that already exists, whether or not it holds a
/// catalog.
pub async fn run_init(config: &Config) -> Result<()> {
    let path = &config.catalog.path;
    if path.exists() {
        return Err(ConfigError::CatalogExists(path.clone()).into());
    }

    let mut catalog = Catalog::create(path).await?;
    catalog.close().await;

    println!("Catalog initialized at {}", path.display());
    Ok(())
}
