//! Link discovery stage
//!
//! Walks a community's paginated listing, extracting post links page by
//! page. The link store is persisted after every page so an interruption
//! loses at most one page of discovery work, and the stored page cursor
//! lets the next run continue where this one stopped.

use crate::config::CommunityConfig;
use crate::crawler::capabilities::{ExtractError, ListPage};
use crate::crawler::retry::{fetch_with_retry, request_pause};
use crate::crawler::CrawlContext;
use crate::storage::{write_snapshot, Stores};
use crate::{GleanError, Result};

/// What one community's discovery pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Listing pages fetched this pass
    pub pages_walked: u32,

    /// New links appended to the store
    pub links_added: usize,

    /// Pages that failed to fetch or parse (snapshot written, page skipped)
    pub failed_pages: u32,

    /// True when the site signalled end-of-results before the page bound
    pub end_of_results: bool,
}

/// Discovers post links for one community
///
/// Resumes from the persisted page cursor: pages `page_offset +
/// pages_done + 1` through `page_offset + total_pages`, stopping early on
/// an end-of-results signal. A malformed page-URL template surfaces as a
/// configuration error for the caller to log and skip.
pub async fn discover_community(
    ctx: &CrawlContext<'_>,
    community: &CommunityConfig,
    stores: &mut Stores,
) -> Result<DiscoveryReport> {
    let name = community.name.as_str();
    let mut report = DiscoveryReport::default();

    let done = stores.links.pages_done(name);
    if done >= community.total_pages {
        tracing::info!("Community {}: all {} pages already discovered", name, done);
        return Ok(report);
    }

    let first = community.page_offset + done + 1;
    let last = community.page_offset + community.total_pages;
    tracing::info!(
        "Community {}: discovering pages {}..={}",
        name,
        first,
        last
    );

    for page in first..=last {
        if page > first {
            request_pause(ctx.request_delay_ms.0, ctx.request_delay_ms.1).await;
        }

        let page_url = community.page_url(page)?;
        report.pages_walked += 1;

        match fetch_with_retry(ctx.fetcher, page_url.as_str(), &ctx.retry).await {
            Ok(body) => match ctx.lists.extract(&body, &ctx.base_url) {
                Ok(ListPage::Links(urls)) => {
                    let added = stores.links.record_page(name, urls);
                    stores.links.save()?;
                    report.links_added += added;
                    tracing::info!(
                        "Community {}: page {} yielded {} new links",
                        name,
                        page,
                        added
                    );
                }
                Ok(ListPage::EndOfResults) => {
                    tracing::info!("Community {}: end of results at page {}", name, page);
                    report.end_of_results = true;
                    break;
                }
                Err(ExtractError::ParseFailure(message)) => {
                    tracing::warn!(
                        "Community {}: page {} failed to parse: {}",
                        name,
                        page,
                        message
                    );
                    write_snapshot(&ctx.snapshot_dir, page_url.as_str(), Some(page), &body)?;
                    // The page slot is consumed so resumption does not
                    // re-walk a permanently broken page.
                    stores.links.record_page(name, Vec::new());
                    stores.links.save()?;
                    report.failed_pages += 1;
                }
            },
            Err(fetch_err) => {
                tracing::warn!(
                    "Community {}: page {} unreachable: {}",
                    name,
                    page,
                    fetch_err
                );
                write_snapshot(
                    &ctx.snapshot_dir,
                    page_url.as_str(),
                    Some(page),
                    &format!("<!-- fetch failed after retries: {fetch_err} -->"),
                )?;
                stores.links.record_page(name, Vec::new());
                stores.links.save()?;
                report.failed_pages += 1;
            }
        }
    }

    Ok(report)
}

/// Runs discovery across all configured communities
///
/// A community with a malformed URL template is logged and skipped; any
/// other error aborts the run.
pub async fn discover_all(
    ctx: &CrawlContext<'_>,
    communities: &[CommunityConfig],
    stores: &mut Stores,
) -> Result<()> {
    for community in communities {
        match discover_community(ctx, community, stores).await {
            Ok(report) => {
                tracing::info!(
                    "Community {}: discovery done ({} pages, {} new links, {} failed)",
                    community.name,
                    report.pages_walked,
                    report.links_added,
                    report.failed_pages
                );
            }
            Err(GleanError::Config(e)) => {
                tracing::warn!(
                    "Skipping community {} due to configuration error: {}",
                    community.name,
                    e
                );
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcilePolicy;
    use crate::crawler::capabilities::{
        FetchError, ListExtractor, PageFetcher, PostExtractor, PostPage, ReplyPage,
    };
    use crate::crawler::retry::RetryPolicy;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tempfile::TempDir;
    use url::Url;

    /// Serves canned bodies keyed by URL
    struct MapFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    /// Reads one line per link; "END" means end-of-results
    struct LineListExtractor;

    impl ListExtractor for LineListExtractor {
        fn extract(
            &self,
            page: &str,
            _base: &Url,
        ) -> std::result::Result<ListPage, ExtractError> {
            if page.trim() == "END" {
                return Ok(ListPage::EndOfResults);
            }
            Ok(ListPage::Links(
                page.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect(),
            ))
        }
    }

    struct NoopPostExtractor;

    impl PostExtractor for NoopPostExtractor {
        fn extract_post(&self, _page: &str) -> std::result::Result<PostPage, ExtractError> {
            Ok(PostPage::NoContent)
        }

        fn extract_replies(
            &self,
            _page: &str,
            _base: &Url,
        ) -> std::result::Result<ReplyPage, ExtractError> {
            Ok(ReplyPage {
                replies: vec![],
                next_page: None,
            })
        }
    }

    fn context<'a>(
        fetcher: &'a dyn PageFetcher,
        lists: &'a dyn ListExtractor,
        posts: &'a dyn PostExtractor,
        dir: &TempDir,
    ) -> CrawlContext<'a> {
        CrawlContext {
            fetcher,
            lists,
            posts,
            base_url: Url::parse("https://f.example").unwrap(),
            retry: RetryPolicy {
                max_attempts: 2,
                delay_min_ms: 0,
                delay_max_ms: 0,
            },
            request_delay_ms: (0, 0),
            save_every: 10,
            reconcile: ReconcilePolicy::Replace,
            retry_errored: false,
            snapshot_dir: dir.path().join("snapshots"),
        }
    }

    fn community(pages: u32) -> CommunityConfig {
        CommunityConfig {
            name: "c1".to_string(),
            url_template: "https://f.example/list?page={page}".to_string(),
            total_pages: pages,
            page_offset: 0,
        }
    }

    #[tokio::test]
    async fn test_walks_all_pages_and_collects_links() {
        let dir = TempDir::new().unwrap();
        let fetcher = MapFetcher {
            pages: HashMap::from([
                (
                    "https://f.example/list?page=1".to_string(),
                    "https://f.example/a\nhttps://f.example/b".to_string(),
                ),
                (
                    "https://f.example/list?page=2".to_string(),
                    "https://f.example/c".to_string(),
                ),
            ]),
        };
        let lists = LineListExtractor;
        let posts = NoopPostExtractor;
        let ctx = context(&fetcher, &lists, &posts, &dir);
        let mut stores = Stores::open(&dir.path().join("data")).unwrap();

        let report = discover_community(&ctx, &community(2), &mut stores)
            .await
            .unwrap();

        assert_eq!(report.pages_walked, 2);
        assert_eq!(report.links_added, 3);
        assert_eq!(stores.links.pages_done("c1"), 2);
        assert_eq!(
            stores.links.links("c1"),
            &["https://f.example/a", "https://f.example/b", "https://f.example/c"]
        );
    }

    #[tokio::test]
    async fn test_end_of_results_stops_early() {
        let dir = TempDir::new().unwrap();
        let fetcher = MapFetcher {
            pages: HashMap::from([
                (
                    "https://f.example/list?page=1".to_string(),
                    "https://f.example/a".to_string(),
                ),
                ("https://f.example/list?page=2".to_string(), "END".to_string()),
                (
                    "https://f.example/list?page=3".to_string(),
                    "https://f.example/never".to_string(),
                ),
            ]),
        };
        let lists = LineListExtractor;
        let posts = NoopPostExtractor;
        let ctx = context(&fetcher, &lists, &posts, &dir);
        let mut stores = Stores::open(&dir.path().join("data")).unwrap();

        let report = discover_community(&ctx, &community(3), &mut stores)
            .await
            .unwrap();

        assert!(report.end_of_results);
        assert_eq!(report.pages_walked, 2);
        assert_eq!(stores.links.links("c1"), &["https://f.example/a"]);
    }

    #[tokio::test]
    async fn test_resumes_after_pages_done() {
        let dir = TempDir::new().unwrap();
        let fetcher = MapFetcher {
            pages: HashMap::from([(
                "https://f.example/list?page=2".to_string(),
                "https://f.example/b".to_string(),
            )]),
        };
        let lists = LineListExtractor;
        let posts = NoopPostExtractor;
        let ctx = context(&fetcher, &lists, &posts, &dir);
        let mut stores = Stores::open(&dir.path().join("data")).unwrap();

        // Page 1 was already discovered in a previous run.
        stores
            .links
            .record_page("c1", vec!["https://f.example/a".to_string()]);

        let report = discover_community(&ctx, &community(2), &mut stores)
            .await
            .unwrap();

        // Only page 2 is fetched; page-1 links are not re-emitted.
        assert_eq!(report.pages_walked, 1);
        assert_eq!(
            stores.links.links("c1"),
            &["https://f.example/a", "https://f.example/b"]
        );
    }

    #[tokio::test]
    async fn test_unreachable_page_snapshots_and_continues() {
        let dir = TempDir::new().unwrap();
        let fetcher = MapFetcher {
            pages: HashMap::from([(
                "https://f.example/list?page=2".to_string(),
                "https://f.example/b".to_string(),
            )]),
        };
        let lists = LineListExtractor;
        let posts = NoopPostExtractor;
        let ctx = context(&fetcher, &lists, &posts, &dir);
        let mut stores = Stores::open(&dir.path().join("data")).unwrap();

        let report = discover_community(&ctx, &community(2), &mut stores)
            .await
            .unwrap();

        assert_eq!(report.failed_pages, 1);
        assert_eq!(report.links_added, 1);
        assert_eq!(stores.links.pages_done("c1"), 2);
        assert!(ctx.snapshot_dir.exists());
    }

    #[tokio::test]
    async fn test_malformed_template_skips_community_in_discover_all() {
        let dir = TempDir::new().unwrap();
        let fetcher = MapFetcher {
            pages: HashMap::from([(
                "https://f.example/list?page=1".to_string(),
                "https://f.example/a".to_string(),
            )]),
        };
        let lists = LineListExtractor;
        let posts = NoopPostExtractor;
        let ctx = context(&fetcher, &lists, &posts, &dir);
        let mut stores = Stores::open(&dir.path().join("data")).unwrap();

        let broken = CommunityConfig {
            name: "broken".to_string(),
            url_template: "not a url {page}".to_string(),
            total_pages: 1,
            page_offset: 0,
        };
        let communities = vec![broken, community(1)];

        discover_all(&ctx, &communities, &mut stores).await.unwrap();

        // The malformed community contributed nothing; the good one ran.
        assert!(stores.links.links("broken").is_empty());
        assert_eq!(stores.links.links("c1"), &["https://f.example/a"]);
    }
}
