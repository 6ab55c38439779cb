//! Crawl orchestration
//!
//! The orchestrator owns the run: it enforces the session precondition
//! exactly once, sequences link discovery then detail fetch, maintains the
//! community cursor that lets an interrupted run resume mid-community, and
//! guarantees that every exit path (success or abort) flushes the stores.

use crate::config::{CommunityConfig, Config};
use crate::crawler::detail::fetch_details;
use crate::crawler::discovery::discover_all;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::{
    CrawlContext, ListExtractor, PageFetcher, PostExtractor, SessionManager,
};
use crate::storage::Stores;
use crate::Result;
use std::path::{Path, PathBuf};
use url::Url;

/// Which parts of a run to execute
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Clear all previous crawl state before starting
    pub fresh: bool,

    /// Run the link discovery stage
    pub discover: bool,

    /// Run the detail fetch stage
    pub details: bool,

    /// Reattempt URLs previously classified Errored
    pub retry_errored: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            fresh: false,
            discover: true,
            details: true,
            retry_errored: false,
        }
    }
}

/// Sequences a complete crawl run over the configured communities
pub struct Orchestrator<'a> {
    ctx: CrawlContext<'a>,
    communities: Vec<CommunityConfig>,
    stores: Stores,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator, opening (and optionally clearing) the
    /// durable stores
    pub fn new(
        config: &Config,
        fetcher: &'a dyn PageFetcher,
        lists: &'a dyn ListExtractor,
        posts: &'a dyn PostExtractor,
        options: &RunOptions,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.site.base_url)?;

        let mut stores = Stores::open(Path::new(&config.output.data_dir))?;
        if options.fresh {
            tracing::info!("Starting fresh crawl: clearing previous state");
            stores.clear_all()?;
        }

        let ctx = CrawlContext {
            fetcher,
            lists,
            posts,
            base_url,
            retry: RetryPolicy::from_config(&config.crawler),
            request_delay_ms: (
                config.crawler.request_delay_min_ms,
                config.crawler.request_delay_max_ms,
            ),
            save_every: config.crawler.save_every,
            reconcile: config.crawler.reconcile,
            retry_errored: options.retry_errored,
            snapshot_dir: PathBuf::from(&config.output.snapshot_dir),
        };

        Ok(Self {
            ctx,
            communities: config.communities.clone(),
            stores,
        })
    }

    /// Runs the crawl: session gate, discovery, then detail fetch
    ///
    /// The session gate runs exactly once per process; its failure is fatal
    /// since no fetch can succeed without an authenticated session. All
    /// stores are flushed on every exit path.
    pub async fn run(
        &mut self,
        session: &mut dyn SessionManager,
        options: &RunOptions,
    ) -> Result<()> {
        if !session.restore().await? {
            tracing::info!("No stored session; requesting manual authentication");
            session.prompt_and_persist().await?;
        }
        tracing::info!("Session established");

        let result = self.run_stages(options).await;

        if let Err(flush_err) = self.stores.save_all() {
            tracing::error!("Failed to flush stores on exit: {}", flush_err);
            if result.is_ok() {
                return Err(flush_err.into());
            }
        }
        result
    }

    async fn run_stages(&mut self, options: &RunOptions) -> Result<()> {
        if options.discover {
            discover_all(&self.ctx, &self.communities, &mut self.stores).await?;
        }
        if options.details {
            self.fetch_all_details().await?;
        }
        Ok(())
    }

    /// Detail fetch across communities, honoring the persisted cursor
    ///
    /// The cursor names the community a previous run was interrupted in;
    /// communities before it were fully drained and are skipped without a
    /// rescan. A cursor naming an unknown community is ignored.
    async fn fetch_all_details(&mut self) -> Result<()> {
        let cursor = self.stores.progress.current_community().map(String::from);
        let cursor_known = cursor
            .as_deref()
            .is_some_and(|c| self.communities.iter().any(|x| x.name == c));
        let mut reached = !cursor_known;

        for i in 0..self.communities.len() {
            let name = self.communities[i].name.clone();

            if !reached {
                if cursor.as_deref() == Some(name.as_str()) {
                    reached = true;
                } else {
                    tracing::info!("Skipping community {} (completed in a previous run)", name);
                    continue;
                }
            }

            self.stores.progress.set_current_community(Some(name.clone()));
            self.stores.progress.save()?;

            fetch_details(&self.ctx, &name, &mut self.stores).await?;

            self.stores.progress.set_current_community(None);
            self.stores.progress.save()?;
        }
        Ok(())
    }

    /// Read access to the stores, for reporting after a run
    pub fn stores(&self) -> &Stores {
        &self.stores
    }
}
