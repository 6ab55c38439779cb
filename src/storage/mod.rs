//! Storage module for persisting crawl data
//!
//! This module owns every durable artifact of a crawl:
//! - the link store (community -> discovered post URLs + page cursor)
//! - the post store (community -> ordered post records)
//! - the progress store (post URL -> terminal outcome, plus the community
//!   cursor used for resumption)
//! - diagnostic snapshots of pages that failed to fetch or parse
//!
//! All three stores are single JSON files written with replace-on-write
//! semantics (write to a temp file, then rename) so a crash never leaves a
//! truncated store behind.

mod atomic;
mod link_store;
mod post_store;
mod progress_store;
mod snapshot;

pub use atomic::{read_json_or_default, write_json_atomic};
pub use link_store::LinkStore;
pub use post_store::PostStore;
pub use progress_store::ProgressStore;
pub use snapshot::write_snapshot;

use crate::timeparse::TimeValue;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store file is corrupted: {path}")]
    Corrupted { path: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A fully fetched post with its replies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Post URL; unique key within and across communities
    pub url: String,

    /// Post title, when the site renders one separately from the body
    pub title: Option<String>,

    /// Publication time, or the original text when unparseable
    pub time: TimeValue,

    /// Author display name
    pub author: String,

    /// Link to the author's profile, when present
    pub author_link: Option<String>,

    /// Primary content text
    pub content: String,

    /// Replies in on-page order
    pub replies: Vec<ReplyRecord>,
}

/// A single reply to a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRecord {
    /// Reply content text
    pub content: String,

    /// Reply time, or the original text when unparseable
    pub time: TimeValue,

    /// Commenter display name, when identifiable
    pub commenter: Option<String>,

    /// Link to the commenter's profile, when present
    pub commenter_link: Option<String>,
}

/// The three durable stores of a crawl, opened together
pub struct Stores {
    pub links: LinkStore,
    pub posts: PostStore,
    pub progress: ProgressStore,
}

impl Stores {
    /// Opens (or initializes) all stores under a data directory
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        Ok(Self {
            links: LinkStore::load(&data_dir.join("links.json"))?,
            posts: PostStore::load(&data_dir.join("posts.json"))?,
            progress: ProgressStore::load(&data_dir.join("progress.json"))?,
        })
    }

    /// Persists every store
    ///
    /// Called on the periodic save cadence and on every abort path, so
    /// buffered state is never lost to an error exit.
    pub fn save_all(&self) -> StorageResult<()> {
        self.links.save()?;
        self.posts.save()?;
        self.progress.save()?;
        Ok(())
    }

    /// Drops all in-memory and on-disk state for a fresh crawl
    pub fn clear_all(&mut self) -> StorageResult<()> {
        self.links.clear();
        self.posts.clear();
        self.progress.clear();
        self.save_all()
    }
}
