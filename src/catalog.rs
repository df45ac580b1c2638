//! The catalog store.
//!
//! [`Catalog`] owns the connection to one catalog database and is the only
//! place that reads or writes persisted state. It is passed by reference to
//! the scan and tagging operations; nothing holds a connection globally.
//!
//! # Lifecycle
//!
//! | Call | Effect |
//! |------|--------|
//! | [`Catalog::create`] | create a new database file and its schema |
//! | [`Catalog::open`] | connect to an existing file and verify its schema |
//! | [`Catalog::close`] | release the connection; later calls fail with `NotConnected` |
//!
//! Commands acquire a catalog with [`open_existing`], run their work, and
//! call `close` before inspecting the result, so the connection is
//! released on success and failure alike.
//!
//! Each mutating method commits before returning. A scan is therefore only
//! as atomic as each individual insert: records written before a failure
//! remain.

use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};

use crate::db;
use crate::error::{CatalogError, ConfigError};
use crate::migrate;
use crate::models::{CatalogStats, FileRecord, TagRecord, TagSummary};

pub struct Catalog {
    pool: Option<SqlitePool>,
    path: PathBuf,
}

impl Catalog {
    /// Connect to an existing catalog at `path` and verify its schema.
    pub async fn open(path: &Path) -> Result<Self, CatalogError> {
        let pool = db::connect(path, false).await?;
        let catalog = Self {
            pool: Some(pool),
            path: path.to_path_buf(),
        };
        catalog.initialize().await?;
        tracing::debug!(path = %path.display(), "catalog opened");
        Ok(catalog)
    }

    /// Create a catalog database at `path` (the file is created if missing)
    /// and write the schema.
    pub async fn create(path: &Path) -> Result<Self, CatalogError> {
        let pool = db::connect(path, true).await?;
        let catalog = Self {
            pool: Some(pool),
            path: path.to_path_buf(),
        };
        catalog.initialize().await?;
        tracing::debug!(path = %path.display(), "catalog created");
        Ok(catalog)
    }

    /// Create the schema if absent. Idempotent on a current-version catalog.
    pub async fn initialize(&self) -> Result<(), CatalogError> {
        migrate::initialize(self.pool()?).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    /// The underlying pool, or `NotConnected` after [`close`](Self::close).
    pub fn pool(&self) -> Result<&SqlitePool, CatalogError> {
        self.pool.as_ref().ok_or(CatalogError::NotConnected)
    }

    /// Release the connection. Calling it twice is harmless.
    pub async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::debug!(path = %self.path.display(), "catalog closed");
        }
    }

    // ---- files ----

    /// Look up a file by its dedup key.
    pub async fn find_file_by_content(
        &self,
        sha256: &str,
        size: i64,
    ) -> Result<Option<i64>, CatalogError> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM file WHERE sha256 = ? AND size = ?")
            .bind(sha256)
            .bind(size)
            .fetch_optional(self.pool()?)
            .await?;
        Ok(id)
    }

    /// Insert a file record without checking for an existing one.
    ///
    /// Callers check [`find_file_by_content`](Self::find_file_by_content)
    /// first; a duplicate `(sha256, size)` surfaces as
    /// [`CatalogError::Integrity`].
    pub async fn insert_file(
        &self,
        location: &str,
        sha256: &str,
        size: i64,
    ) -> Result<i64, CatalogError> {
        let result = sqlx::query("INSERT INTO file (location, sha256, size) VALUES (?, ?, ?)")
            .bind(location)
            .bind(sha256)
            .bind(size)
            .execute(self.pool()?)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// The newest record stored at `location`.
    ///
    /// Locations are not unique: when a file's content changes, a rescan
    /// adds a second record at the same path. The latest one describes what
    /// is there now.
    pub async fn find_file_by_location(
        &self,
        location: &str,
    ) -> Result<Option<FileRecord>, CatalogError> {
        let row = sqlx::query(
            "SELECT id, location, sha256, size FROM file WHERE location = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(location)
        .fetch_optional(self.pool()?)
        .await?;
        Ok(row.map(|r| file_from_row(&r)))
    }

    /// All files, or only those carrying `tag`, ordered by location.
    pub async fn list_files(&self, tag: Option<&str>) -> Result<Vec<FileRecord>, CatalogError> {
        let pool = self.pool()?;
        let rows = match tag {
            Some(name) => {
                sqlx::query(
                    r#"
                    SELECT f.id, f.location, f.sha256, f.size
                    FROM file f
                    JOIN file_tag ft ON ft.file_id = f.id
                    JOIN tag t ON t.id = ft.tag_id
                    WHERE t.name = ?
                    ORDER BY f.location, f.id
                    "#,
                )
                .bind(name)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query("SELECT id, location, sha256, size FROM file ORDER BY location, id")
                    .fetch_all(pool)
                    .await?
            }
        };
        Ok(rows.iter().map(file_from_row).collect())
    }

    // ---- tags ----

    /// Return the id of tag `name`, creating it if needed.
    pub async fn find_or_create_tag(&self, name: &str) -> Result<i64, CatalogError> {
        if name.is_empty() {
            return Err(CatalogError::InvalidTagName);
        }
        let pool = self.pool()?;
        sqlx::query("INSERT INTO tag (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(pool)
            .await?;
        let id: i64 = sqlx::query_scalar("SELECT id FROM tag WHERE name = ?")
            .bind(name)
            .fetch_one(pool)
            .await?;
        Ok(id)
    }

    pub async fn find_tag(&self, name: &str) -> Result<Option<TagRecord>, CatalogError> {
        let row = sqlx::query("SELECT id, name, description FROM tag WHERE name = ?")
            .bind(name)
            .fetch_optional(self.pool()?)
            .await?;
        Ok(row.map(|r| TagRecord {
            id: r.get("id"),
            name: r.get("name"),
            description: r.get("description"),
        }))
    }

    /// Set or clear the description of an existing tag.
    pub async fn set_tag_description(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), CatalogError> {
        let result = sqlx::query("UPDATE tag SET description = ? WHERE name = ?")
            .bind(description)
            .bind(name)
            .execute(self.pool()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::TagNotFound(name.to_string()));
        }
        Ok(())
    }

    /// Link a file and a tag. Returns `false` if the link already existed.
    pub async fn link_file_tag(&self, file_id: i64, tag_id: i64) -> Result<bool, CatalogError> {
        let result = sqlx::query(
            "INSERT INTO file_tag (file_id, tag_id) VALUES (?, ?) ON CONFLICT(file_id, tag_id) DO NOTHING",
        )
        .bind(file_id)
        .bind(tag_id)
        .execute(self.pool()?)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Tag names attached to a file, sorted.
    pub async fn tags_for_file(&self, file_id: i64) -> Result<Vec<String>, CatalogError> {
        let names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT t.name FROM tag t
            JOIN file_tag ft ON ft.tag_id = t.id
            WHERE ft.file_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(file_id)
        .fetch_all(self.pool()?)
        .await?;
        Ok(names)
    }

    pub async fn list_tags(&self) -> Result<Vec<TagSummary>, CatalogError> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name, t.description, COUNT(ft.file_id) AS file_count
            FROM tag t
            LEFT JOIN file_tag ft ON ft.tag_id = t.id
            GROUP BY t.id
            ORDER BY t.name
            "#,
        )
        .fetch_all(self.pool()?)
        .await?;

        Ok(rows
            .iter()
            .map(|r| TagSummary {
                tag: TagRecord {
                    id: r.get("id"),
                    name: r.get("name"),
                    description: r.get("description"),
                },
                file_count: r.get("file_count"),
            })
            .collect())
    }

    // ---- summary ----

    pub async fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let pool = self.pool()?;
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM file) AS files,
                (SELECT COALESCE(SUM(size), 0) FROM file) AS total_bytes,
                (SELECT COUNT(*) FROM tag) AS tags,
                (SELECT COUNT(*) FROM file_tag) AS associations,
                (SELECT COUNT(*) FROM file f
                    WHERE NOT EXISTS (SELECT 1 FROM file_tag ft WHERE ft.file_id = f.id)
                ) AS untagged_files
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(CatalogStats {
            files: row.get("files"),
            total_bytes: row.get("total_bytes"),
            tags: row.get("tags"),
            associations: row.get("associations"),
            untagged_files: row.get("untagged_files"),
            schema_version: migrate::schema_version(pool).await?,
        })
    }
}

fn file_from_row(row: &sqlx::sqlite::SqliteRow) -> FileRecord {
    FileRecord {
        id: row.get("id"),
        location: row.get("location"),
        sha256: row.get("sha256"),
        size: row.get("size"),
    }
}

/// Open the existing catalog at `path`.
///
/// A missing file is reported as [`ConfigError::CatalogMissing`] before any
/// connection is attempted, so nothing is created as a side effect.
pub async fn open_existing(path: &Path) -> anyhow::Result<Catalog> {
    if !path.is_file() {
        return Err(ConfigError::CatalogMissing(path.to_path_buf()).into());
    }
    Ok(Catalog::open(path).await?)
}
