//! Session bootstrap implementations
//!
//! The crawl core requires an authenticated session before any fetch; this
//! module provides the concrete cookie-file implementation used by the CLI.

mod cookie;

pub use cookie::{CookieSession, StoredCookie};
