//! Configuration module for Forum-Gleaner
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files.
//!
//! # Example
//!
//! ```no_run
//! use forum_gleaner::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Communities configured: {}", config.communities.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CommunityConfig, Config, CrawlerConfig, OutputConfig, ReconcilePolicy, SessionConfig,
    SiteConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
