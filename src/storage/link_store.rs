//! Durable per-community link collections with a page cursor
//!
//! Link discovery appends newly seen post URLs here, one listing page at a
//! time, and bumps `pages_done` after each page is persisted. Resuming a
//! crawl reads the cursor and continues at the next unread page, so an
//! interruption loses at most one page of discovery work.

use crate::storage::atomic::{read_json_or_default, write_json_atomic};
use crate::storage::StorageResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct CommunityLinks {
    /// Number of listing pages fully discovered and persisted
    pages_done: u32,

    /// Discovered post URLs in discovery order; deduplicated by exact URL
    links: Vec<String>,
}

/// Durable community -> discovered links mapping
pub struct LinkStore {
    path: PathBuf,
    data: BTreeMap<String, CommunityLinks>,
}

impl LinkStore {
    /// Loads the store from disk, starting empty if the file is absent
    pub fn load(path: &Path) -> StorageResult<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            data: read_json_or_default(path)?,
        })
    }

    /// Persists the store with atomic replace
    pub fn save(&self) -> StorageResult<()> {
        write_json_atomic(&self.path, &self.data)
    }

    /// Number of listing pages already discovered for a community
    pub fn pages_done(&self, community: &str) -> u32 {
        self.data.get(community).map_or(0, |c| c.pages_done)
    }

    /// All links discovered for a community, in discovery order
    pub fn links(&self, community: &str) -> &[String] {
        self.data.get(community).map_or(&[], |c| c.links.as_slice())
    }

    /// Communities that have at least one discovery entry
    pub fn communities(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Records one fully discovered listing page for a community
    ///
    /// Appends URLs not already present (exact-string dedup across the
    /// community's whole collection) and advances the page cursor. Returns
    /// the number of links actually added.
    pub fn record_page(&mut self, community: &str, urls: Vec<String>) -> usize {
        let entry = self.data.entry(community.to_string()).or_default();
        let seen: HashSet<&String> = entry.links.iter().collect();

        let fresh: Vec<String> = {
            let mut fresh = Vec::new();
            for url in urls {
                if !seen.contains(&url) && !fresh.contains(&url) {
                    fresh.push(url);
                }
            }
            fresh
        };

        let added = fresh.len();
        entry.links.extend(fresh);
        entry.pages_done += 1;
        added
    }

    /// Total number of discovered links across all communities
    pub fn total_links(&self) -> usize {
        self.data.values().map(|c| c.links.len()).sum()
    }

    /// Drops every community's links and cursors
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> LinkStore {
        LinkStore::load(&dir.path().join("links.json")).unwrap()
    }

    #[test]
    fn test_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.pages_done("c1"), 0);
        assert!(store.links("c1").is_empty());
        assert_eq!(store.total_links(), 0);
    }

    #[test]
    fn test_record_page_appends_and_advances_cursor() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        let added = store.record_page(
            "c1",
            vec!["https://f.example/a".to_string(), "https://f.example/b".to_string()],
        );

        assert_eq!(added, 2);
        assert_eq!(store.pages_done("c1"), 1);
        assert_eq!(store.links("c1").len(), 2);
    }

    #[test]
    fn test_dedup_across_pages() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        store.record_page("c1", vec!["https://f.example/a".to_string()]);
        let added = store.record_page(
            "c1",
            vec!["https://f.example/a".to_string(), "https://f.example/c".to_string()],
        );

        assert_eq!(added, 1);
        assert_eq!(store.links("c1"), &["https://f.example/a", "https://f.example/c"]);
        assert_eq!(store.pages_done("c1"), 2);
    }

    #[test]
    fn test_dedup_within_page() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        let added = store.record_page(
            "c1",
            vec!["https://f.example/a".to_string(), "https://f.example/a".to_string()],
        );

        assert_eq!(added, 1);
        assert_eq!(store.links("c1").len(), 1);
    }

    #[test]
    fn test_empty_page_still_advances_cursor() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);

        assert_eq!(store.record_page("c1", vec![]), 0);
        assert_eq!(store.pages_done("c1"), 1);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.json");

        {
            let mut store = LinkStore::load(&path).unwrap();
            store.record_page("c1", vec!["https://f.example/a".to_string()]);
            store.record_page("c1", vec!["https://f.example/b".to_string()]);
            store.save().unwrap();
        }

        let store = LinkStore::load(&path).unwrap();
        assert_eq!(store.pages_done("c1"), 2);
        assert_eq!(store.links("c1"), &["https://f.example/a", "https://f.example/b"]);
    }
}
