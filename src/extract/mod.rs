//! Concrete extractor implementations
//!
//! The crawl core only knows the extractor traits; this module holds the
//! thin site adapters that turn raw page content into structured records.

mod discuz;

pub use discuz::{DiscuzListExtractor, DiscuzPostExtractor};
