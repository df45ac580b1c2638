//! Core data models used throughout TaggerDB.
//!
//! These types mirror the rows of the catalog (`file`, `tag`) and the
//! results handed back to the CLI by the scan and tagging operations.

use serde::Serialize;

/// A catalogued file. One record exists per distinct `(sha256, size)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub id: i64,
    /// Path relative to the storage root at the time the content was first seen.
    pub location: String,
    pub sha256: String,
    pub size: i64,
}

/// A tag as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// A tag plus the number of files carrying it.
#[derive(Debug, Clone, Serialize)]
pub struct TagSummary {
    #[serde(flatten)]
    pub tag: TagRecord,
    pub file_count: i64,
}

/// Totals reported at the end of a scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Regular files digested during the walk.
    pub processed: u64,
    /// Files inserted as new records.
    pub added: u64,
    /// Files whose content was already catalogued.
    pub duplicates: u64,
    /// Entries not considered: symlinks, special files, excluded paths.
    pub skipped: u64,
}

/// Result of associating a set of tags with one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TagOutcome {
    pub linked: usize,
    pub already_linked: usize,
}

/// Aggregate counts over the whole catalog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogStats {
    pub files: i64,
    pub total_bytes: i64,
    pub tags: i64,
    pub associations: i64,
    pub untagged_files: i64,
    pub schema_version: i64,
}
