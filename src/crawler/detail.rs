//! Detail fetch stage
//!
//! Consumes the link store: every URL without a terminal outcome is
//! fetched, parsed, and walked through its reply pages, then classified as
//! Processed, Empty, or Errored. The post and progress stores are always
//! persisted together so a Processed mark and its record can never
//! diverge. Single-post failures are recorded and skipped, never allowed
//! to abort the batch.

use crate::crawler::capabilities::{ExtractError, PostPage, ReplyPage};
use crate::crawler::retry::{fetch_with_retry, request_pause};
use crate::crawler::CrawlContext;
use crate::state::ProgressState;
use crate::storage::{write_snapshot, PostRecord, Stores};
use crate::Result;
use std::collections::HashSet;

/// What one community's detail pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DetailReport {
    /// Posts fetched, parsed, and stored
    pub processed: usize,

    /// URLs classified Errored (snapshot written)
    pub errored: usize,

    /// URLs classified Empty
    pub empty: usize,

    /// URLs skipped because a terminal outcome was already recorded
    pub skipped: usize,
}

/// How a single post attempt ended, before stores are touched
enum PostOutcome {
    Stored(Box<PostRecord>),
    Empty,
    Errored {
        reason: String,
        page_content: Option<String>,
    },
}

/// Fetches details for every undone link of one community
pub async fn fetch_details(
    ctx: &CrawlContext<'_>,
    community: &str,
    stores: &mut Stores,
) -> Result<DetailReport> {
    let links: Vec<String> = stores.links.links(community).to_vec();
    let mut report = DetailReport::default();
    let mut since_save = 0usize;
    let mut attempted = 0usize;

    tracing::info!(
        "Community {}: fetching details for {} discovered links",
        community,
        links.len()
    );

    for url in links {
        if stores.progress.is_done(&url, ctx.retry_errored) {
            report.skipped += 1;
            continue;
        }

        if attempted > 0 {
            request_pause(ctx.request_delay_ms.0, ctx.request_delay_ms.1).await;
        }
        attempted += 1;

        match attempt_post(ctx, &url).await {
            PostOutcome::Stored(record) => {
                tracing::info!(
                    "Processed {} ({} replies)",
                    url,
                    record.replies.len()
                );
                stores.posts.upsert(community, *record, ctx.reconcile);
                stores.progress.mark(&url, ProgressState::Processed);
                report.processed += 1;
                since_save += 1;

                if since_save >= ctx.save_every {
                    save_posts_and_progress(stores)?;
                    since_save = 0;
                }
            }
            PostOutcome::Empty => {
                tracing::info!("No usable content at {}", url);
                stores.progress.mark(&url, ProgressState::Empty);
                save_posts_and_progress(stores)?;
                since_save = 0;
                report.empty += 1;
            }
            PostOutcome::Errored {
                reason,
                page_content,
            } => {
                tracing::warn!("Failed to process {}: {}", url, reason);
                let snapshot_body = page_content
                    .unwrap_or_else(|| format!("<!-- fetch failed after retries: {reason} -->"));
                write_snapshot(&ctx.snapshot_dir, &url, None, &snapshot_body)?;
                stores.progress.mark(&url, ProgressState::Errored);
                save_posts_and_progress(stores)?;
                since_save = 0;
                report.errored += 1;
            }
        }
    }

    save_posts_and_progress(stores)?;

    tracing::info!(
        "Community {}: detail pass done ({} processed, {} empty, {} errored, {} skipped)",
        community,
        report.processed,
        report.empty,
        report.errored,
        report.skipped
    );
    Ok(report)
}

/// The post and progress stores are only ever written as a pair.
fn save_posts_and_progress(stores: &Stores) -> Result<()> {
    stores.posts.save()?;
    stores.progress.save()?;
    Ok(())
}

/// Fetches and assembles one post with all of its reply pages
async fn attempt_post(ctx: &CrawlContext<'_>, url: &str) -> PostOutcome {
    let body = match fetch_with_retry(ctx.fetcher, url, &ctx.retry).await {
        Ok(body) => body,
        Err(e) => {
            return PostOutcome::Errored {
                reason: e.to_string(),
                page_content: None,
            }
        }
    };

    let fields = match ctx.posts.extract_post(&body) {
        Ok(PostPage::Post(fields)) => fields,
        Ok(PostPage::NoContent) => return PostOutcome::Empty,
        Err(ExtractError::ParseFailure(message)) => {
            return PostOutcome::Errored {
                reason: message,
                page_content: Some(body),
            }
        }
    };

    // Walk reply pagination, starting with the post page itself.
    let mut replies = Vec::new();
    let mut visited: HashSet<String> = HashSet::from([url.to_string()]);
    let mut page_content = body;

    loop {
        let ReplyPage {
            replies: page_replies,
            next_page,
        } = match ctx.posts.extract_replies(&page_content, &ctx.base_url) {
            Ok(reply_page) => reply_page,
            Err(ExtractError::ParseFailure(message)) => {
                return PostOutcome::Errored {
                    reason: format!("reply extraction: {message}"),
                    page_content: Some(page_content),
                }
            }
        };

        replies.extend(page_replies);

        let Some(next_url) = next_page else { break };
        if !visited.insert(next_url.clone()) {
            tracing::warn!("Reply pagination loop at {} (via {})", next_url, url);
            break;
        }

        request_pause(ctx.request_delay_ms.0, ctx.request_delay_ms.1).await;
        page_content = match fetch_with_retry(ctx.fetcher, &next_url, &ctx.retry).await {
            Ok(body) => body,
            Err(e) => {
                return PostOutcome::Errored {
                    reason: format!("reply page {next_url}: {e}"),
                    page_content: None,
                }
            }
        };
    }

    PostOutcome::Stored(Box::new(PostRecord {
        url: url.to_string(),
        title: fields.title,
        time: fields.time,
        author: fields.author,
        author_link: fields.author_link,
        content: fields.content,
        replies,
    }))
}
