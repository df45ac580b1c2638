//! Listing catalogued files and tags.
//!
//! Backs `taggerdb files` and `taggerdb tags`. Both print an aligned table
//! by default, or a JSON array with `--json`.

use anyhow::Result;
use serde::Serialize;

use crate::catalog::{self, Catalog};
use crate::config::Config;
use crate::error::CatalogError;
use crate::models::{FileRecord, TagSummary};

/// A file together with its tags, as printed by `taggerdb files`.
#[derive(Debug, Clone, Serialize)]
pub struct FileListing {
    #[serde(flatten)]
    pub file: FileRecord,
    pub tags: Vec<String>,
}

/// Files in the catalog (optionally only those tagged `tag`) with their tags.
pub async fn list_files(catalog: &Catalog, tag: Option<&str>) -> Result<Vec<FileListing>, CatalogError> {
    if let Some(name) = tag {
        if catalog.find_tag(name).await?.is_none() {
            return Err(CatalogError::TagNotFound(name.to_string()));
        }
    }

    let files = catalog.list_files(tag).await?;
    let mut listings = Vec::with_capacity(files.len());
    for file in files {
        let tags = catalog.tags_for_file(file.id).await?;
        listings.push(FileListing { file, tags });
    }
    Ok(listings)
}

/// CLI entry point for `taggerdb files`.
pub async fn run_files(config: &Config, tag: Option<&str>, json: bool) -> Result<()> {
    let mut catalog = catalog::open_existing(&config.catalog.path).await?;
    let result = list_files(&catalog, tag).await;
    catalog.close().await;
    let listings = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    if listings.is_empty() {
        println!("No files catalogued.");
        return Ok(());
    }

    println!("{:>6}  {:>10}  {:<12}  {}", "ID", "SIZE", "SHA256", "LOCATION");
    for entry in &listings {
        let tags = if entry.tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", entry.tags.join(", "))
        };
        println!(
            "{:>6}  {:>10}  {:<12}  {}{}",
            entry.file.id,
            entry.file.size,
            &entry.file.sha256[..entry.file.sha256.len().min(12)],
            entry.file.location,
            tags
        );
    }
    Ok(())
}

/// CLI entry point for `taggerdb tags`.
pub async fn run_tags(config: &Config, json: bool) -> Result<()> {
    let mut catalog = catalog::open_existing(&config.catalog.path).await?;
    let result = catalog.list_tags().await;
    catalog.close().await;
    let tags: Vec<TagSummary> = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }

    if tags.is_empty() {
        println!("No tags defined.");
        return Ok(());
    }

    println!("{:<24} {:>6}  {}", "TAG", "FILES", "DESCRIPTION");
    for summary in &tags {
        println!(
            "{:<24} {:>6}  {}",
            summary.tag.name,
            summary.file_count,
            summary.tag.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
