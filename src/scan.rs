//! Scan reconciliation.
//!
//! Walks a storage tree and brings the catalog up to date with its
//! contents. Identity is content, not location: every regular file is
//! hashed, and a new record is written only when its `(sha256, size)` pair
//! is not catalogued yet. A file that was renamed, moved, or copied is
//! recognised as already known.
//!
//! # Entry policy
//!
//! | Entry | Handling |
//! |-------|----------|
//! | directory | descended |
//! | directory matching an exclude glob | not descended, counted once as skipped |
//! | regular file | hashed and reconciled |
//! | symlink | skipped, unless `follow_symlinks` is set |
//! | FIFO, socket, device | skipped |
//! | file matching an exclude glob | skipped |
//! | path not valid UTF-8 | skipped |
//! | the catalog's own database files | skipped |
//! | unreadable directory | scan fails ([`ScanError::Walk`]) |
//! | unreadable regular file | scan fails ([`ScanError::Io`]) |
//!
//! Entries are visited in file-name order within each directory. Each
//! insert commits on its own, so a failed scan keeps the records written
//! before the failure. Nothing about an entry is kept once it has been
//! written through; the summary only counts.

use anyhow::Result;
use std::cell::Cell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::catalog::{self, Catalog};
use crate::config::{self, Config};
use crate::digest;
use crate::error::{ConfigError, ScanError};
use crate::models::{FileRecord, ScanSummary};
use crate::progress::{ProgressMode, ScanEvent, ScanReporter};
use crate::tagging;

/// Suffixes SQLite appends to a database path for its side files.
const CATALOG_SIDE_FILES: &[&str] = &["-wal", "-shm", "-journal"];

/// Walk policy for a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub follow_symlinks: bool,
    pub exclude_globs: Vec<String>,
    /// Absolute paths that are never catalogued.
    pub ignore: Vec<PathBuf>,
    /// Tags attached to every file the scan adds, right after its insert.
    pub tags: Vec<String>,
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            follow_symlinks: config.scan.follow_symlinks,
            exclude_globs: config.scan.exclude_globs.clone(),
            ignore: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[String]) -> Self {
        self.tags = tags.to_vec();
        self
    }

    /// Never catalogue the database at `catalog_path` or its side files,
    /// in case the catalog lives inside the storage tree.
    pub fn ignoring_catalog(mut self, catalog_path: &Path) -> Self {
        if let Ok(canonical) = catalog_path.canonicalize() {
            for suffix in CATALOG_SIDE_FILES {
                let mut side: OsString = canonical.clone().into_os_string();
                side.push(suffix);
                self.ignore.push(PathBuf::from(side));
            }
            self.ignore.push(canonical);
        }
        self
    }
}

/// Check that `root` is an existing directory and return its canonical form.
pub fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    let metadata = match std::fs::metadata(root) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::StorageMissing(root.to_path_buf()).into())
        }
        Err(source) => {
            return Err(ScanError::Io {
                path: root.to_path_buf(),
                source,
            })
        }
    };
    if !metadata.is_dir() {
        return Err(ConfigError::StorageNotDirectory(root.to_path_buf()).into());
    }
    root.canonicalize().map_err(|source| ScanError::Io {
        path: root.to_path_buf(),
        source,
    })
}

/// Reconcile the catalog with the regular files under `root`.
///
/// The root is validated before the catalog is queried. Every added file
/// is reported to `reporter` as it is written, and tagged with
/// `options.tags` if any are given.
pub async fn scan_storage(
    catalog: &Catalog,
    root: &Path,
    options: &ScanOptions,
    reporter: &dyn ScanReporter,
) -> Result<ScanSummary, ScanError> {
    let root = validate_root(root)?;
    let exclude_set = config::build_globset(&options.exclude_globs)?;

    let mut summary = ScanSummary::default();
    let pruned = Cell::new(0u64);

    let walker = WalkDir::new(&root)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            match relative_location(&root, entry.path()) {
                Some(location) if exclude_set.is_match(&location) => {
                    tracing::debug!(%location, "excluded directory");
                    pruned.set(pruned.get() + 1);
                    false
                }
                _ => true,
            }
        });
    for entry in walker {
        let entry = entry?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }

        let path = entry.path();
        if !file_type.is_file() {
            tracing::debug!(path = %path.display(), "skipping non-regular entry");
            summary.skipped += 1;
            continue;
        }
        if options.ignore.iter().any(|ignored| ignored == path) {
            tracing::debug!(path = %path.display(), "skipping catalog file");
            summary.skipped += 1;
            continue;
        }

        let Some(location) = relative_location(&root, path) else {
            tracing::debug!(path = %path.display(), "skipping path that is not valid UTF-8");
            summary.skipped += 1;
            continue;
        };
        if exclude_set.is_match(&location) {
            tracing::debug!(%location, "excluded");
            summary.skipped += 1;
            continue;
        }

        let content = digest::sha256_file(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let size = i64::try_from(content.size).map_err(|_| ScanError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "file too large"),
        })?;
        summary.processed += 1;

        match catalog.find_file_by_content(&content.sha256, size).await? {
            Some(existing_id) => {
                tracing::debug!(%location, existing_id, "content already catalogued");
                summary.duplicates += 1;
                reporter.report(ScanEvent::Duplicate {
                    location: &location,
                    existing_id,
                });
            }
            None => {
                let id = catalog
                    .insert_file(&location, &content.sha256, size)
                    .await?;
                if !options.tags.is_empty() {
                    tagging::associate_tags(catalog, id, options.tags.as_slice()).await?;
                }
                summary.added += 1;
                reporter.report(ScanEvent::Added(&FileRecord {
                    id,
                    location,
                    sha256: content.sha256,
                    size,
                }));
            }
        }
    }
    summary.skipped += pruned.get();

    tracing::info!(
        root = %root.display(),
        processed = summary.processed,
        added = summary.added,
        duplicates = summary.duplicates,
        skipped = summary.skipped,
        "scan complete"
    );
    reporter.report(ScanEvent::Finished(&summary));
    Ok(summary)
}

/// `path` relative to `root`, with `/` separators on every platform.
///
/// `None` if any component is not valid UTF-8; such a path cannot be
/// stored without losing the way back to the file.
fn relative_location(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// CLI entry point for `taggerdb scan`.
///
/// Preconditions are checked in order, before the catalog is opened: the
/// catalog file must exist, then the storage root must be a directory,
/// then every tag name must be valid. With `tags`, each file is tagged as
/// soon as it is added.
pub async fn run_scan(config: &Config, tags: &[String], mode: ProgressMode) -> Result<()> {
    let catalog_path = &config.catalog.path;
    if !catalog_path.is_file() {
        return Err(ConfigError::CatalogMissing(catalog_path.clone()).into());
    }
    let root = config.storage_root()?;
    validate_root(root)?;
    tagging::normalize_names(tags)?;

    let options = ScanOptions::from_config(config)
        .ignoring_catalog(catalog_path)
        .with_tags(tags);
    let reporter = mode.reporter();

    let mut catalog = catalog::open_existing(catalog_path).await?;
    let result = scan_storage(&catalog, root, &options, reporter.as_ref()).await;
    catalog.close().await;
    let summary = result?;

    if !tags.is_empty() && summary.added > 0 && mode == ProgressMode::Human {
        println!(
            "Tagged {} new file{} with: {}",
            summary.added,
            if summary.added == 1 { "" } else { "s" },
            tags.join(", ")
        );
    }
    Ok(())
}
