//! Forum-Gleaner: a resumable forum crawl pipeline
//!
//! This crate implements an incremental crawler for paginated forum
//! communities: it discovers post links from listing pages, fetches each
//! post with its paginated replies, and checkpoints progress so interrupted
//! runs resume without re-fetching or duplicating data.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod session;
pub mod state;
pub mod storage;
pub mod timeparse;

use thiserror::Error;

/// Main error type for Forum-Gleaner operations
#[derive(Debug, Error)]
pub enum GleanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] crawler::SessionError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Extraction error: {0}")]
    Extract(#[from] crawler::ExtractError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid page URL template for community {community}: {template}")]
    InvalidTemplate { community: String, template: String },
}

/// Result type alias for Forum-Gleaner operations
pub type Result<T> = std::result::Result<T, GleanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use state::ProgressState;
pub use storage::{PostRecord, ReplyRecord};
pub use timeparse::{normalize, TimeValue};
