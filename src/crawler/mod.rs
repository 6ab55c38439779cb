//! Crawler module: the crawl state machine and its stages
//!
//! This module contains the core crawling logic, including:
//! - Capability traits the core is written against (fetcher, extractors,
//!   session manager)
//! - Bounded retry with randomized delays
//! - The link discovery and detail fetch stages
//! - The orchestrator that sequences a whole run

mod capabilities;
mod detail;
mod discovery;
mod fetcher;
mod orchestrator;
mod retry;

pub use capabilities::{
    ExtractError, FetchError, ListExtractor, ListPage, PageFetcher, PostExtractor, PostFields,
    PostPage, ReplyPage, SessionError, SessionManager,
};
pub use detail::{fetch_details, DetailReport};
pub use discovery::{discover_all, discover_community, DiscoveryReport};
pub use fetcher::{build_http_client, CookieHeader, HttpFetcher};
pub use orchestrator::{Orchestrator, RunOptions};
pub use retry::{fetch_with_retry, request_pause, RetryPolicy};

use crate::config::ReconcilePolicy;
use std::path::PathBuf;
use url::Url;

/// Everything a stage needs, threaded explicitly instead of living in
/// process-wide state: the capability implementations plus the run's
/// policies and paths.
pub struct CrawlContext<'a> {
    /// Page fetcher capability
    pub fetcher: &'a dyn PageFetcher,

    /// Listing-page extractor capability
    pub lists: &'a dyn ListExtractor,

    /// Post/reply extractor capability
    pub posts: &'a dyn PostExtractor,

    /// Base URL for resolving relative post links
    pub base_url: Url,

    /// Bounded retry policy for every fetch
    pub retry: RetryPolicy,

    /// Randomized delay range between consecutive requests (ms)
    pub request_delay_ms: (u64, u64),

    /// Persist the post/progress pair after this many successes
    pub save_every: usize,

    /// How refetched posts merge with stored records
    pub reconcile: ReconcilePolicy,

    /// Treat Errored entries as retryable this run
    pub retry_errored: bool,

    /// Where diagnostic snapshots are written
    pub snapshot_dir: PathBuf,
}
