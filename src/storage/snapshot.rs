//! Diagnostic page snapshots
//!
//! When a page exhausts its retries or fails to parse, the raw content is
//! written out with a URL banner so the failure can be inspected offline.
//! Snapshots are the failure-reporting surface: nothing about a failed
//! page is kept only in memory.

use crate::storage::StorageResult;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes a snapshot of fetched page content for offline inspection
///
/// The file name is derived from the URL's last path segment (sanitized)
/// plus an optional page number, so repeated failures of the same page
/// overwrite their previous snapshot instead of accumulating.
///
/// Returns the path of the written snapshot.
pub fn write_snapshot(
    dir: &Path,
    url: &str,
    page_num: Option<u32>,
    content: &str,
) -> StorageResult<PathBuf> {
    fs::create_dir_all(dir)?;

    let base = sanitize_stem(url);
    let name = match page_num {
        Some(n) => format!("{base}_page_{n}.html"),
        None => format!("{base}.html"),
    };

    let path = dir.join(name);
    let banner = format!(
        "<!-- Page URL: {url} -->\n<div style=\"font-weight: bold; margin-bottom: 20px;\">Page URL: {url}</div>\n"
    );
    fs::write(&path, format!("{banner}{content}"))?;
    Ok(path)
}

/// Derives a filesystem-safe file stem from a URL
fn sanitize_stem(url: &str) -> String {
    let tail = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("page");

    let cleaned: String = tail
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "page".to_string()
    } else {
        cleaned
    }
}
