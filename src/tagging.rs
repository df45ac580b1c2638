//! Tag association.
//!
//! Attaches a set of tag names to one catalogued file. Tags are created on
//! first use and links are idempotent, so applying the same set twice, or
//! in a different order, leaves the catalog in the same state.

use anyhow::Result;
use std::collections::BTreeSet;

use crate::catalog::{self, Catalog};
use crate::config::Config;
use crate::error::CatalogError;
use crate::models::TagOutcome;

/// Deduplicate `names`, rejecting empty ones.
pub fn normalize_names<S: AsRef<str>>(names: &[S]) -> Result<BTreeSet<&str>, CatalogError> {
    let mut set = BTreeSet::new();
    for name in names {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(CatalogError::InvalidTagName);
        }
        set.insert(name);
    }
    Ok(set)
}

/// Ensure every tag in `names` exists and is linked to `file_id`.
///
/// An empty set is a no-op. Names are validated before anything is
/// written.
pub async fn associate_tags<S: AsRef<str>>(
    catalog: &Catalog,
    file_id: i64,
    names: &[S],
) -> Result<TagOutcome, CatalogError> {
    let names = normalize_names(names)?;
    let mut outcome = TagOutcome::default();

    for name in names {
        let tag_id = catalog.find_or_create_tag(name).await?;
        if catalog.link_file_tag(file_id, tag_id).await? {
            outcome.linked += 1;
        } else {
            outcome.already_linked += 1;
        }
    }

    tracing::debug!(
        file_id,
        linked = outcome.linked,
        already_linked = outcome.already_linked,
        "tags associated"
    );
    Ok(outcome)
}

/// CLI entry point for `taggerdb tag <LOCATION> <TAG>...`.
pub async fn run_tag(config: &Config, location: &str, tags: &[String]) -> Result<()> {
    let location = location.trim_start_matches("./");

    let mut catalog = catalog::open_existing(&config.catalog.path).await?;
    let result = tag_location(&catalog, location, tags).await;
    catalog.close().await;
    let (outcome, all_tags) = result?;

    println!(
        "Tagged \"{}\": {} added, {} already present",
        location, outcome.linked, outcome.already_linked
    );
    println!("  tags: {}", all_tags.join(", "));
    Ok(())
}

async fn tag_location(
    catalog: &Catalog,
    location: &str,
    tags: &[String],
) -> Result<(TagOutcome, Vec<String>), CatalogError> {
    let file = catalog
        .find_file_by_location(location)
        .await?
        .ok_or_else(|| CatalogError::FileNotFound(location.to_string()))?;
    let outcome = associate_tags(catalog, file.id, tags).await?;
    let all_tags = catalog.tags_for_file(file.id).await?;
    Ok((outcome, all_tags))
}

/// CLI entry point for `taggerdb describe <TAG> [TEXT]`.
pub async fn run_describe(config: &Config, tag: &str, description: Option<&str>) -> Result<()> {
    let description = description.map(str::trim).filter(|d| !d.is_empty());

    let mut catalog = catalog::open_existing(&config.catalog.path).await?;
    let result = catalog.set_tag_description(tag, description).await;
    catalog.close().await;
    result?;

    match description {
        Some(text) => println!("Tag \"{}\": {}", tag, text),
        None => println!("Tag \"{}\": description cleared", tag),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn fresh() -> (TempDir, Catalog, i64, i64) {
        let tmp = TempDir::new().unwrap();
        let catalog = Catalog::create(&tmp.path().join("tagger.db3")).await.unwrap();
        let a = catalog.insert_file("a.txt", "aa", 1).await.unwrap();
        let b = catalog.insert_file("b.txt", "bb", 1).await.unwrap();
        (tmp, catalog, a, b)
    }

    async fn count(catalog: &Catalog, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(catalog.pool().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn tagging_twice_keeps_one_association() {
        let (_tmp, catalog, a, _) = fresh().await;

        let first = associate_tags(&catalog, a, &["draft"]).await.unwrap();
        let second = associate_tags(&catalog, a, &["draft"]).await.unwrap();

        assert_eq!(first, TagOutcome { linked: 1, already_linked: 0 });
        assert_eq!(second, TagOutcome { linked: 0, already_linked: 1 });
        assert_eq!(count(&catalog, "file_tag").await, 1);
        assert_eq!(count(&catalog, "tag").await, 1);
    }

    #[tokio::test]
    async fn tag_is_shared_between_files() {
        let (_tmp, catalog, a, b) = fresh().await;

        associate_tags(&catalog, a, &["shared"]).await.unwrap();
        associate_tags(&catalog, b, &["shared"]).await.unwrap();

        assert_eq!(count(&catalog, "tag").await, 1);
        assert_eq!(count(&catalog, "file_tag").await, 2);
        assert_eq!(catalog.list_files(Some("shared")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_set_is_a_no_op() {
        let (_tmp, catalog, a, _) = fresh().await;
        let none: [&str; 0] = [];

        let outcome = associate_tags(&catalog, a, &none).await.unwrap();

        assert_eq!(outcome, TagOutcome::default());
        assert_eq!(count(&catalog, "tag").await, 0);
    }

    #[tokio::test]
    async fn empty_name_rejects_whole_set() {
        let (_tmp, catalog, a, _) = fresh().await;

        let err = associate_tags(&catalog, a, &["ok", ""]).await.unwrap_err();

        assert!(matches!(err, CatalogError::InvalidTagName));
        assert_eq!(count(&catalog, "tag").await, 0);
        assert_eq!(count(&catalog, "file_tag").await, 0);
    }

    #[tokio::test]
    async fn order_and_repeats_do_not_matter() {
        let (_tmp, catalog, a, b) = fresh().await;

        associate_tags(&catalog, a, &["x", "y", "z", "x"]).await.unwrap();
        associate_tags(&catalog, b, &["z", "y", "x"]).await.unwrap();

        assert_eq!(catalog.tags_for_file(a).await.unwrap(), vec!["x", "y", "z"]);
        assert_eq!(
            catalog.tags_for_file(a).await.unwrap(),
            catalog.tags_for_file(b).await.unwrap()
        );
        assert_eq!(count(&catalog, "tag").await, 3);
        assert_eq!(count(&catalog, "file_tag").await, 6);
    }

    #[tokio::test]
    async fn unknown_file_is_an_integrity_fault() {
        let (_tmp, catalog, _, _) = fresh().await;

        let err = associate_tags(&catalog, 4242, &["ghost"]).await.unwrap_err();

        assert!(matches!(err, CatalogError::Integrity(_)));
        assert_eq!(count(&catalog, "file_tag").await, 0);
    }

    #[tokio::test]
    async fn tag_location_resolves_file() {
        let (_tmp, catalog, _, _) = fresh().await;

        let (outcome, tags) = tag_location(&catalog, "b.txt", &["one".to_string()])
            .await
            .unwrap();
        assert_eq!(outcome.linked, 1);
        assert_eq!(tags, vec!["one"]);

        let err = tag_location(&catalog, "missing.txt", &["one".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn tag_location_follows_changed_content() {
        let tmp = TempDir::new().unwrap();
        let storage = tmp.path().join("storage");
        std::fs::create_dir_all(&storage).unwrap();
        let catalog = Catalog::create(&tmp.path().join("tagger.db3")).await.unwrap();
        let options = crate::scan::ScanOptions::default();
        let quiet = crate::progress::NoProgress;

        std::fs::write(storage.join("a.txt"), "v1").unwrap();
        crate::scan::scan_storage(&catalog, &storage, &options, &quiet)
            .await
            .unwrap();
        std::fs::write(storage.join("a.txt"), "version two").unwrap();
        crate::scan::scan_storage(&catalog, &storage, &options, &quiet)
            .await
            .unwrap();

        tag_location(&catalog, "a.txt", &["current".to_string()])
            .await
            .unwrap();

        let tagged = catalog.list_files(Some("current")).await.unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].size, "version two".len() as i64);
    }

    #[test]
    fn normalize_dedups() {
        let names = normalize_names(&["b", "a", "b"]).unwrap();
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
