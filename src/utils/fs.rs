//! Whole-file writes that never leave a partial file behind.
//!
//! Content goes to a temporary file in the destination directory, which is
//! then renamed over the target. Readers see either the old file, the new
//! file, or nothing.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{ErrorCode, FetchError, Result};

/// Atomically replace `path` with `contents`, creating parent directories.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(dir).map_err(|e| {
        FetchError::io_error(
            ErrorCode::IoWriteError,
            format!("Failed to create directory {}", dir.display()),
            e,
        )
    })?;

    let write_error = |e: std::io::Error| {
        FetchError::io_error(
            ErrorCode::IoWriteError,
            format!("Failed to write {}", path.display()),
            e,
        )
    };

    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(contents).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    tracing::debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Serialize `value` as 2-space indented JSON and write it atomically.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        FetchError::with_source(ErrorCode::IoWriteError, "Failed to serialize JSON", e)
    })?;
    write_atomic(path, json.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src").join("data").join("out.json");

        write_atomic(&path, b"{}").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
    }

    #[test]
    fn test_write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old contents").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        // No stray temp files left next to the target
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_json_pretty_indents_two_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");

        write_json_pretty(&path, &serde_json::json!({"stars": 1})).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\n  \"stars\": 1\n}");
    }
}
