//! Bounded retry with randomized inter-attempt delay
//!
//! Every fetch (listing page, detail page, reply page) goes through the
//! same policy: a small fixed attempt budget with a randomized pause
//! between attempts so retries never hit the site on a uniform clock.
//! Exhaustion is classified by the caller, not here.

use crate::config::CrawlerConfig;
use crate::crawler::capabilities::{FetchError, PageFetcher};
use rand::Rng;
use std::time::Duration;

/// Fixed-bounded retry parameters
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum fetch attempts; at least 1
    pub max_attempts: u32,

    /// Randomized inter-attempt delay range in milliseconds
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay_min_ms: config.retry_delay_min_ms,
            delay_max_ms: config.retry_delay_max_ms,
        }
    }

    fn delay(&self) -> Duration {
        Duration::from_millis(random_in_range(self.delay_min_ms, self.delay_max_ms))
    }
}

/// Fetches a URL, retrying transient failures up to the policy's budget
///
/// Performs at most `max_attempts` fetch calls. Returns the first success,
/// or the last error once the budget is exhausted.
pub async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    url: &str,
    policy: &RetryPolicy,
) -> Result<String, FetchError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match fetcher.fetch(url).await {
            Ok(body) => return Ok(body),
            Err(e) if attempt >= policy.max_attempts => {
                tracing::warn!(
                    "Fetch failed for {} after {} attempts: {}",
                    url,
                    attempt,
                    e
                );
                return Err(e);
            }
            Err(e) => {
                tracing::debug!(
                    "Fetch attempt {}/{} failed for {}: {}, retrying",
                    attempt,
                    policy.max_attempts,
                    url,
                    e
                );
                let delay = policy.delay();
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Sleeps for a randomized interval between consecutive requests
///
/// The spread keeps request timing non-uniform so the crawl does not trip
/// rate-based blocking on the target site.
pub async fn request_pause(min_ms: u64, max_ms: u64) {
    let delay = Duration::from_millis(random_in_range(min_ms, max_ms));
    tokio::time::sleep(delay).await;
}

fn random_in_range(min_ms: u64, max_ms: u64) -> u64 {
    if min_ms >= max_ms {
        min_ms
    } else {
        rand::thread_rng().gen_range(min_ms..=max_ms)
    }
}
