//! Cookie-file session manager
//!
//! Restores a previously saved cookie jar from disk, or blocks on an
//! interactive console prompt where the operator logs in with a browser
//! and pastes the resulting cookie string. Either way the cookies end up
//! in the shared header slot the HTTP fetcher reads from, and on disk for
//! the next run.

use crate::crawler::{CookieHeader, SessionError, SessionManager};
use crate::storage::write_json_atomic;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// One persisted cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
}

impl StoredCookie {
    fn parse_pair(pair: &str) -> Option<Self> {
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            value: value.trim().to_string(),
        })
    }
}

/// Session manager backed by a JSON cookie file and a console prompt
pub struct CookieSession {
    cookie_file: PathBuf,
    login_url: String,
    header: CookieHeader,
}

impl CookieSession {
    pub fn new(cookie_file: PathBuf, login_url: String) -> Self {
        Self {
            cookie_file,
            login_url,
            header: Arc::new(RwLock::new(None)),
        }
    }

    /// Wires this session to an existing fetcher cookie slot
    pub fn with_header_slot(mut self, header: CookieHeader) -> Self {
        self.header = header;
        self
    }

    fn apply(&self, cookies: &[StoredCookie]) {
        let header = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        *self.header.write().unwrap() = Some(header);
    }
}

#[async_trait]
impl SessionManager for CookieSession {
    /// Loads the persisted cookie jar, if one exists
    async fn restore(&mut self) -> Result<bool, SessionError> {
        if !self.cookie_file.exists() {
            tracing::info!("No cookie file at {}", self.cookie_file.display());
            return Ok(false);
        }

        let content = std::fs::read_to_string(&self.cookie_file)?;
        let cookies: Vec<StoredCookie> = serde_json::from_str(&content)
            .map_err(|e| SessionError::Restore(e.to_string()))?;

        if cookies.is_empty() {
            return Ok(false);
        }

        tracing::info!("Restored {} cookies", cookies.len());
        self.apply(&cookies);
        Ok(true)
    }

    /// Blocks on the console until the operator supplies session cookies
    async fn prompt_and_persist(&mut self) -> Result<(), SessionError> {
        println!("Log in with a browser at: {}", self.login_url);
        println!("Then paste the Cookie header value (name=value; name=value) and press Enter:");

        let mut line = String::new();
        std::io::stdout().flush()?;
        std::io::stdin().lock().read_line(&mut line)?;

        let cookies: Vec<StoredCookie> = line
            .trim()
            .split(';')
            .filter_map(StoredCookie::parse_pair)
            .collect();

        if cookies.is_empty() {
            return Err(SessionError::Auth(
                "no cookies were provided".to_string(),
            ));
        }

        write_json_atomic(&self.cookie_file, &cookies)
            .map_err(|e| SessionError::Auth(e.to_string()))?;
        tracing::info!(
            "Persisted {} cookies to {}",
            cookies.len(),
            self.cookie_file.display()
        );

        self.apply(&cookies);
        Ok(())
    }
}
