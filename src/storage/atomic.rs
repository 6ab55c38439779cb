//! Atomic replace-on-write JSON persistence
//!
//! Stores are written to a sibling temp file and renamed over the target,
//! so a crash mid-write leaves either the old store or the new one, never a
//! truncated file.

use crate::storage::{StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Writes a value as pretty JSON with replace-on-write semantics
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    let json = serde_json::to_string_pretty(value)?;
    fs::write(tmp, json)?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Reads a JSON value, returning the default when the file does not exist
///
/// A file that exists but does not parse is reported as corrupted rather
/// than silently replaced: losing a store to one bad write would discard
/// all recorded progress.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> StorageResult<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|_| StorageError::Corrupted {
        path: path.display().to_string(),
    })
}
