//! HTTP fetcher implementation
//!
//! The concrete `PageFetcher` used in production: a reqwest client with a
//! browser-style user agent and the session cookie header applied to every
//! request. The crawl core only sees the `PageFetcher` trait, so this can
//! be swapped for a headless-browser fetcher without touching the stages.

use crate::crawler::capabilities::{FetchError, PageFetcher};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Shared, updatable cookie header slot
///
/// The session manager writes here once the session gate has run; the
/// fetcher reads it on every request. Shared so the gate can run after the
/// fetcher is constructed.
pub type CookieHeader = Arc<RwLock<Option<String>>>;

/// Builds an HTTP client with the crawler's standard configuration
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed page fetcher with session cookie support
pub struct HttpFetcher {
    client: Client,
    cookies: CookieHeader,
}

impl HttpFetcher {
    /// Creates a fetcher with a fresh, empty cookie slot
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent)?,
            cookies: Arc::new(RwLock::new(None)),
        })
    }

    /// Creates a fetcher sharing an existing cookie slot
    pub fn with_cookie_header(user_agent: &str, cookies: CookieHeader) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent)?,
            cookies,
        })
    }

    /// Handle to the cookie slot, for wiring up a session manager
    pub fn cookie_handle(&self) -> CookieHeader {
        Arc::clone(&self.cookies)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let cookie_header = self.cookies.read().unwrap().clone();

        let mut request = self.client.get(url);
        if let Some(header) = cookie_header {
            request = request.header(COOKIE, header);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
