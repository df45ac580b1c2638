//! Catalog statistics.
//!
//! A quick summary of what's catalogued: file, tag and association counts,
//! total content size, and how many files carry no tag. Used by
//! `taggerdb stats`.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::catalog;
use crate::config::Config;
use crate::progress::format_number;

/// Run the stats command: query the catalog and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let path = &config.catalog.path;

    let mut catalog = catalog::open_existing(path).await?;
    let result = catalog.stats().await;
    catalog.close().await;
    let stats = result?;

    let metadata = std::fs::metadata(path).ok();
    let db_size = metadata.as_ref().map(|m| m.len()).unwrap_or(0);
    let modified = metadata
        .and_then(|m| m.modified().ok())
        .map(|t| format_time(DateTime::<Utc>::from(t)))
        .unwrap_or_else(|| "unknown".to_string());

    println!("TaggerDB — Catalog Stats");
    println!("========================");
    println!();
    println!("  Catalog:       {}", path.display());
    println!("  Size:          {}", format_bytes(db_size));
    println!("  Modified:      {}", modified);
    println!("  Schema:        v{}", stats.schema_version);
    println!();
    println!("  Files:         {}", format_number(stats.files as u64));
    println!("  Content:       {}", format_bytes(stats.total_bytes as u64));
    println!("  Tags:          {}", format_number(stats.tags as u64));
    println!("  Associations:  {}", format_number(stats.associations as u64));
    println!(
        "  Untagged:      {} / {} ({}%)",
        format_number(stats.untagged_files as u64),
        format_number(stats.files as u64),
        if stats.files > 0 {
            (stats.untagged_files * 100) / stats.files
        } else {
            0
        }
    );
    println!();

    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}
