//! Durable processing-state table for post URLs
//!
//! Maps every attempted post URL to its terminal outcome and carries the
//! single community cursor used for mid-crawl resumption. Absence of an
//! entry means the URL has not been attempted.

use crate::state::ProgressState;
use crate::storage::atomic::{read_json_or_default, write_json_atomic};
use crate::storage::StorageResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressData {
    /// Community the detail stage was working through when last persisted
    current_community: Option<String>,

    /// URL -> terminal outcome
    entries: BTreeMap<String, ProgressState>,
}

/// Durable URL -> outcome mapping with a community cursor
pub struct ProgressStore {
    path: PathBuf,
    data: ProgressData,
}

impl ProgressStore {
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

    /// Returns the recorded outcome for a URL, if any
    pub fn get(&self, url: &str) -> Option<ProgressState> {
        self.data.entries.get(url).copied()
    }

    /// Returns true if the URL already carries a terminal outcome
    ///
    /// With `retry_errored`, Errored entries are treated as retryable so a
    /// later run can reattempt them.
    pub fn is_done(&self, url: &str, retry_errored: bool) -> bool {
        match self.get(url) {
            Some(ProgressState::Errored) => !retry_errored,
            Some(_) => true,
            None => false,
        }
    }

    /// Records an outcome for a URL, overwriting any previous entry
    pub fn mark(&mut self, url: &str, state: ProgressState) {
        self.data.entries.insert(url.to_string(), state);
    }

    /// The community cursor, if one was persisted mid-crawl
    pub fn current_community(&self) -> Option<&str> {
        self.data.current_community.as_deref()
    }

    /// Updates the community cursor
    pub fn set_current_community(&mut self, community: Option<String>) {
        self.data.current_community = community;
    }

    /// All URLs currently marked Processed
    pub fn processed_urls(&self) -> impl Iterator<Item = &str> {
        self.data
            .entries
            .iter()
            .filter(|(_, s)| s.is_success())
            .map(|(url, _)| url.as_str())
    }

    /// Outcome counts for reporting
    pub fn counts(&self) -> BTreeMap<ProgressState, usize> {
        let mut counts = BTreeMap::new();
        for state in self.data.entries.values() {
            *counts.entry(*state).or_insert(0) += 1;
        }
        counts
    }

    /// Total number of recorded entries
    pub fn len(&self) -> usize {
        self.data.entries.len()
    }

    /// Returns true if nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.data.entries.is_empty()
    }

    /// Drops every entry and the cursor
    pub fn clear(&mut self) {
        self.data = ProgressData::default();
    }
}
