//! Forum-Gleaner main entry point
//!
//! Command-line interface for the resumable forum crawl pipeline.

use clap::Parser;
use forum_gleaner::config::load_config_with_hash;
use forum_gleaner::crawler::{HttpFetcher, Orchestrator, RunOptions};
use forum_gleaner::extract::{DiscuzListExtractor, DiscuzPostExtractor};
use forum_gleaner::session::CookieSession;
use forum_gleaner::storage::Stores;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Forum-Gleaner: a resumable forum crawl pipeline
///
/// Discovers post links from each configured community's paginated
/// listing, then fetches every post with its replies, checkpointing
/// progress so interrupted runs pick up where they left off.
#[derive(Parser, Debug)]
#[command(name = "forum-gleaner")]
#[command(version = "1.0.0")]
#[command(about = "A resumable forum crawl pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl, discarding previous state
    #[arg(long)]
    fresh: bool,

    /// Only discover post links; skip detail fetching
    #[arg(long, conflicts_with = "details_only")]
    discover_only: bool,

    /// Only fetch details for already discovered links
    #[arg(long, conflicts_with = "discover_only")]
    details_only: bool,

    /// Reattempt posts that previously ended in an error
    #[arg(long)]
    retry_errored: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the stores and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &cli).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("forum_gleaner=info,warn"),
            1 => EnvFilter::new("forum_gleaner=debug,info"),
            2 => EnvFilter::new("forum_gleaner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &forum_gleaner::Config) {
    println!("=== Forum-Gleaner Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max attempts per fetch: {}", config.crawler.max_attempts);
    println!(
        "  Retry delay: {}-{}ms",
        config.crawler.retry_delay_min_ms, config.crawler.retry_delay_max_ms
    );
    println!(
        "  Request delay: {}-{}ms",
        config.crawler.request_delay_min_ms, config.crawler.request_delay_max_ms
    );
    println!("  Save cadence: every {} posts", config.crawler.save_every);
    println!("  Reconcile policy: {:?}", config.crawler.reconcile);

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);

    println!("\nOutput:");
    println!("  Data directory: {}", config.output.data_dir);
    println!("  Snapshot directory: {}", config.output.snapshot_dir);

    println!("\nCommunities ({}):", config.communities.len());
    for community in &config.communities {
        let template_ok = community.page_url(community.page_offset + 1).is_ok();
        println!(
            "  - {} ({} pages from offset {}){}",
            community.name,
            community.total_pages,
            community.page_offset,
            if template_ok {
                ""
            } else {
                "  [INVALID TEMPLATE - will be skipped]"
            }
        );
    }

    let total_pages: u32 = config.communities.iter().map(|c| c.total_pages).sum();
    println!("\n✓ Configuration is valid");
    println!("✓ Would walk up to {} listing pages", total_pages);
}

/// Handles the --stats mode: shows statistics from the stores
fn handle_stats(config: &forum_gleaner::Config) -> anyhow::Result<()> {
    println!("Data directory: {}\n", config.output.data_dir);

    let stores = Stores::open(Path::new(&config.output.data_dir))?;

    println!("Discovered links: {}", stores.links.total_links());
    for community in stores.links.communities() {
        println!(
            "  - {}: {} links, {} pages walked",
            community,
            stores.links.links(community).len(),
            stores.links.pages_done(community)
        );
    }

    println!("\nStored posts: {}", stores.posts.total_posts());
    for (community, count) in stores.posts.counts() {
        println!("  - {}: {} posts", community, count);
    }

    println!("\nProgress entries: {}", stores.progress.len());
    for (state, count) in stores.progress.counts() {
        println!("  - {}: {}", state, count);
    }
    if let Some(cursor) = stores.progress.current_community() {
        println!("\nInterrupted in community: {}", cursor);
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: forum_gleaner::Config, cli: &Cli) -> anyhow::Result<()> {
    let options = RunOptions {
        fresh: cli.fresh,
        discover: !cli.details_only,
        details: !cli.discover_only,
        retry_errored: cli.retry_errored,
    };

    if options.fresh {
        tracing::info!("Starting fresh crawl (ignoring previous state)");
    } else {
        tracing::info!("Starting crawl (will resume if interrupted run exists)");
    }
    tracing::info!("Communities configured: {}", config.communities.len());

    let fetcher = HttpFetcher::new(&config.site.user_agent)?;
    let mut session = CookieSession::new(
        PathBuf::from(&config.session.cookie_file),
        config.session.login_url.clone(),
    )
    .with_header_slot(fetcher.cookie_handle());

    let lists = DiscuzListExtractor;
    let posts = DiscuzPostExtractor;

    let mut orchestrator = Orchestrator::new(&config, &fetcher, &lists, &posts, &options)?;
    match orchestrator.run(&mut session, &options).await {
        Ok(()) => {
            let stores = orchestrator.stores();
            tracing::info!(
                "Crawl completed: {} links discovered, {} posts stored, {} progress entries",
                stores.links.total_links(),
                stores.posts.total_posts(),
                stores.progress.len()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
