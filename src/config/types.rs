use crate::ConfigError;
use serde::Deserialize;
use url::Url;

/// Main configuration structure for Forum-Gleaner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub site: SiteConfig,
    pub output: OutputConfig,
    pub session: SessionConfig,
    #[serde(default, rename = "community")]
    pub communities: Vec<CommunityConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum fetch attempts per page before classifying the failure
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Lower bound of the randomized delay between retry attempts (ms)
    #[serde(rename = "retry-delay-min-ms", default = "default_retry_delay_min")]
    pub retry_delay_min_ms: u64,

    /// Upper bound of the randomized delay between retry attempts (ms)
    #[serde(rename = "retry-delay-max-ms", default = "default_retry_delay_max")]
    pub retry_delay_max_ms: u64,

    /// Lower bound of the randomized delay between consecutive requests (ms)
    #[serde(rename = "request-delay-min-ms", default = "default_request_delay_min")]
    pub request_delay_min_ms: u64,

    /// Upper bound of the randomized delay between consecutive requests (ms)
    #[serde(rename = "request-delay-max-ms", default = "default_request_delay_max")]
    pub request_delay_max_ms: u64,

    /// Persist post and progress stores after this many successful posts
    #[serde(rename = "save-every", default = "default_save_every")]
    pub save_every: usize,

    /// How a refetched post is merged with an existing record
    #[serde(default)]
    pub reconcile: ReconcilePolicy,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_min() -> u64 {
    1000
}

fn default_retry_delay_max() -> u64 {
    3000
}

fn default_request_delay_min() -> u64 {
    1000
}

fn default_request_delay_max() -> u64 {
    3000
}

fn default_save_every() -> usize {
    10
}

/// Reconciliation policy applied when a post URL is fetched again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilePolicy {
    /// Replace the stored record wholesale (idempotent, duplicate-proof)
    #[default]
    Replace,

    /// Keep the stored record and append newly seen replies
    Append,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL used to resolve relative post links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0 Safari/537.36"
        .to_string()
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding the durable link/post/progress stores
    #[serde(rename = "data-dir")]
    pub data_dir: String,

    /// Directory for diagnostic page snapshots
    #[serde(rename = "snapshot-dir", default = "default_snapshot_dir")]
    pub snapshot_dir: String,
}

fn default_snapshot_dir() -> String {
    "snapshots".to_string()
}

/// Session bootstrap configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Path to the persisted cookie file
    #[serde(rename = "cookie-file")]
    pub cookie_file: String,

    /// Page the operator is asked to log in on
    #[serde(rename = "login-url")]
    pub login_url: String,
}

/// A named, independently paginated forum section to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct CommunityConfig {
    /// Community name; keys the link and post collections
    pub name: String,

    /// Listing page URL template with a `{page}` placeholder, or a base URL
    /// to which the page number is appended as a path segment
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// Number of listing pages to walk
    #[serde(rename = "total-pages", default = "default_total_pages")]
    pub total_pages: u32,

    /// Page numbering starts after this offset
    #[serde(rename = "page-offset", default)]
    pub page_offset: u32,
}

fn default_total_pages() -> u32 {
    1
}

impl CommunityConfig {
    /// Builds the listing URL for a 1-based page number
    ///
    /// A template containing `{page}` has the placeholder substituted;
    /// otherwise the template is treated as a base URL and the page number
    /// is appended as a path segment. A result that does not parse as a URL
    /// is a configuration error for this community only.
    pub fn page_url(&self, page: u32) -> Result<Url, ConfigError> {
        let rendered = if self.url_template.contains("{page}") {
            self.url_template.replace("{page}", &page.to_string())
        } else {
            format!("{}/{}", self.url_template.trim_end_matches('/'), page)
        };

        Url::parse(&rendered).map_err(|_| ConfigError::InvalidTemplate {
            community: self.name.clone(),
            template: self.url_template.clone(),
        })
    }
}
