//! Capability traits the crawl core is written against
//!
//! The core never talks to a browser, an HTML parser, or a credential
//! store directly. Everything volatile and site-specific sits behind these
//! traits: a fetcher that returns fully loaded page content, extractors
//! that turn content into structured records, and a session manager that
//! produces an authenticated context before any crawling starts.

use crate::storage::ReplyRecord;
use crate::timeparse::TimeValue;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// A transient fetch failure; always retryable up to the bounded policy
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Fetch failed for {url}: {message}")]
    Network { url: String, message: String },
}

/// Content was fetched but its structure was not what the extractor expects
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unexpected page structure: {0}")]
    ParseFailure(String),
}

/// Session bootstrap failures; fatal for the whole run
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to restore session: {0}")]
    Restore(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of extracting a listing page
#[derive(Debug, Clone, PartialEq)]
pub enum ListPage {
    /// Post URLs found on the page, already resolved to absolute form
    Links(Vec<String>),

    /// The site signalled that no further results exist
    EndOfResults,
}

/// Fields of a post's primary record, minus URL and replies
#[derive(Debug, Clone, PartialEq)]
pub struct PostFields {
    pub title: Option<String>,
    pub time: TimeValue,
    pub author: String,
    pub author_link: Option<String>,
    pub content: String,
}

/// Result of extracting a post detail page
#[derive(Debug, Clone, PartialEq)]
pub enum PostPage {
    /// A usable post
    Post(PostFields),

    /// The page parsed fine but carries no usable content
    /// (removed post, redirect notice). A terminal non-error outcome.
    NoContent,
}

/// One page of replies plus the link to the next page, if any
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyPage {
    /// Replies in on-page order
    pub replies: Vec<ReplyRecord>,

    /// Absolute URL of the next reply page; None when pagination ends
    pub next_page: Option<String>,
}

/// Returns fully rendered page content for a URL
///
/// Implementations must perform any scroll-to-load behavior before
/// returning, since extractors assume complete content.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Extracts post links from a community listing page
pub trait ListExtractor: Send + Sync {
    fn extract(&self, page: &str, base: &Url) -> Result<ListPage, ExtractError>;
}

/// Extracts a post's primary record and its paginated replies
pub trait PostExtractor: Send + Sync {
    fn extract_post(&self, page: &str) -> Result<PostPage, ExtractError>;

    fn extract_replies(&self, page: &str, base: &Url) -> Result<ReplyPage, ExtractError>;
}

/// Obtains an authenticated session before crawling starts
///
/// `restore` loads previously persisted credentials; when that fails the
/// orchestrator falls back to `prompt_and_persist`, whose concrete form
/// (interactive console, external auth flow) is substitutable.
#[async_trait]
pub trait SessionManager: Send {
    async fn restore(&mut self) -> Result<bool, SessionError>;

    async fn prompt_and_persist(&mut self) -> Result<(), SessionError>;
}
