//! Snapshot builder over a tree of cleaned page files.
//!
//! The scraping stage leaves one `.json` file per page under the corpus
//! root, with `news/` and `people/` subtrees for those sections. This walk
//! turns that tree into a single URL-keyed snapshot.

use super::{DocumentStore, StoreError};
use crate::types::{Category, Document};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

/// A cleaned page as produced by the scraping stage
#[derive(Debug, Deserialize)]
struct CleanedPage {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// Category from the page's location relative to the corpus root
fn category_for(rel_path: &Path) -> Category {
    match rel_path.components().next() {
        Some(c) if c.as_os_str() == "news" => Category::News,
        Some(c) if c.as_os_str() == "people" => Category::People,
        _ => Category::Main,
    }
}

/// Build a snapshot from a directory of cleaned `.json` pages.
///
/// Pages without a URL and files that fail to parse are skipped with a
/// warning; they must not abort the build.
pub fn build_snapshot(cleaned_dir: &Path) -> Result<DocumentStore, StoreError> {
    let mut store = DocumentStore::new();
    let mut skipped = 0usize;

    for entry in WalkDir::new(cleaned_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let rel = path.strip_prefix(cleaned_dir).unwrap_or(path);
        let json = std::fs::read_to_string(path)?;
        let page: CleanedPage = match serde_json::from_str(&json) {
            Ok(page) => page,
            Err(e) => {
                warn!("skipping unparseable page {}: {}", path.display(), e);
                skipped += 1;
                continue;
            }
        };
        if page.url.is_empty() {
            skipped += 1;
            continue;
        }

        store.insert(
            Document::new(page.url, page.content.trim().to_string())
                .with_title(page.title)
                .with_category(category_for(rel)),
        );
    }

    info!("snapshot built: {} pages ({} skipped)", store.len(), skipped);
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_page(dir: &Path, rel: &str, url: &str, title: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let json = serde_json::json!({ "url": url, "title": title, "content": content });
        std::fs::write(path, serde_json::to_string(&json).unwrap()).unwrap();
    }

    #[test]
    fn test_build_snapshot_assigns_categories_from_paths() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "index.json", "https://d.example/", "Главная", "о кафедре");
        write_page(
            dir.path(),
            "news/2024/item.json",
            "https://d.example/news/1",
            "Новость",
            "текст новости",
        );
        write_page(
            dir.path(),
            "people/ivanov.json",
            "https://d.example/people/ivanov",
            "Иванов",
            "биография",
        );

        let store = build_snapshot(dir.path()).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.get("https://d.example/").unwrap().category, Category::Main);
        assert_eq!(store.get("https://d.example/news/1").unwrap().category, Category::News);
        assert_eq!(
            store.get("https://d.example/people/ivanov").unwrap().category,
            Category::People
        );
    }

    #[test]
    fn test_build_snapshot_skips_pages_without_url() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.json", "https://d.example/a", "A", "текст");
        write_page(dir.path(), "b.json", "", "B", "без адреса");

        let store = build_snapshot(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("https://d.example/a").is_some());
    }

    #[test]
    fn test_build_snapshot_skips_unparseable_files() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.json", "https://d.example/a", "A", "текст");
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let store = build_snapshot(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_build_snapshot_ignores_non_json_files() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.json", "https://d.example/a", "A", "текст");
        std::fs::write(dir.path().join("readme.txt"), "plain text").unwrap();

        let store = build_snapshot(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_build_snapshot_trims_page_bodies() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.json", "https://d.example/a", "A", "\n\n  текст  \n");

        let store = build_snapshot(dir.path()).unwrap();
        assert_eq!(store.get("https://d.example/a").unwrap().text, "текст");
    }

    #[test]
    fn test_build_snapshot_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = build_snapshot(dir.path()).unwrap();
        assert!(store.is_empty());
    }
}
