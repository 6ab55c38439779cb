//! Durable per-community post collections
//!
//! Each community owns an ordered list of post records. Writing a record
//! for a URL that already exists is resolved by the reconciliation policy:
//! replace the whole record (default, idempotent) or append the newly seen
//! replies to the existing one.

use crate::config::ReconcilePolicy;
use crate::storage::atomic::{read_json_or_default, write_json_atomic};
use crate::storage::{PostRecord, StorageResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Durable community -> posts mapping
pub struct PostStore {
    path: PathBuf,
    data: BTreeMap<String, Vec<PostRecord>>,
}

impl PostStore {
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

    /// Returns the posts stored for a community
    pub fn posts(&self, community: &str) -> &[PostRecord] {
        self.data.get(community).map_or(&[], Vec::as_slice)
    }

    /// Returns true if any community holds a record for this URL
    pub fn contains_url(&self, url: &str) -> bool {
        self.data
            .values()
            .any(|posts| posts.iter().any(|p| p.url == url))
    }

    /// Writes a post record into a community's collection
    ///
    /// An existing record with the same URL is reconciled per policy:
    /// Replace swaps it in place (preserving collection order), Append
    /// keeps it and extends its reply list with the incoming replies.
    pub fn upsert(&mut self, community: &str, record: PostRecord, policy: ReconcilePolicy) {
        let posts = self.data.entry(community.to_string()).or_default();

        match posts.iter_mut().find(|p| p.url == record.url) {
            Some(existing) => match policy {
                ReconcilePolicy::Replace => *existing = record,
                ReconcilePolicy::Append => existing.replies.extend(record.replies),
            },
            None => posts.push(record),
        }
    }

    /// Post counts per community, for reporting
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.data
            .iter()
            .map(|(name, posts)| (name.clone(), posts.len()))
            .collect()
    }

    /// Total number of stored posts
    pub fn total_posts(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }

    /// Drops every community's posts
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
