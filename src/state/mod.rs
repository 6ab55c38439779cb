//! State module for tracking crawl progress
//!
//! This module provides the terminal progress classification recorded for
//! every post URL the detail stage has attempted.

mod progress;

// Re-export main types
pub use progress::ProgressState;
