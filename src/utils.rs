//! Utility functions for log formatting and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - String truncation for logging long HTML or article bodies
//! - File system validation for output directories
//! - Atomic publication of export files

use crate::error::{NewsError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the characters left out.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => {
            let omitted = s[cut..].chars().count();
            format!("{}…(+{} chars)", &s[..cut], omitted)
        }
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
///
/// # Errors
///
/// [`NewsError::Io`] if the directory cannot be created or written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| NewsError::io(path, e))?;

    let probe = path.join("..__probe_write__");
    fs::write(&probe, b"")
        .await
        .map_err(|e| NewsError::io(&probe, e))?;
    let _ = fs::remove_file(&probe).await;

    info!("Output directory is writable");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write `bytes` to a sibling temporary file, then rename it over `path`.
///
/// Readers of `path` see either the previous file or the complete new one.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), len = bytes.len()))]
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| NewsError::io(parent, e))?;
    }

    let staging = staging_path(path);
    if let Err(e) = fs::write(&staging, bytes).await {
        let _ = fs::remove_file(&staging).await;
        return Err(NewsError::io(&staging, e));
    }
    if let Err(e) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(NewsError::io(path, e));
    }

    debug!("Published file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 chars)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "é".repeat(10);
        assert_eq!(truncate_for_log(&s, 3), "ééé…(+7 chars)");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("data").join("exports");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_rejects_file_path() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("taken");
        std::fs::write(&file, "x").unwrap();
        let err = ensure_writable_dir(&file).await.unwrap_err();
        assert!(matches!(err, NewsError::Io { .. }));
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out").join("cluster_data.json");
        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[tokio::test]
    async fn test_write_atomic_write_failure_keeps_previous_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cluster_data.json");
        std::fs::write(&path, "old").unwrap();
        // The staging name is taken by a directory, so the write fails.
        std::fs::create_dir(staging_path(&path)).unwrap();

        let err = write_atomic(&path, b"new").await.unwrap_err();
        assert!(matches!(err, NewsError::Io { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_write_atomic_rename_failure_cleans_staging_file() {
        let tmp = tempfile::tempdir().unwrap();
        // A non-empty directory at the target makes the rename fail.
        let path = tmp.path().join("cluster_data.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let err = write_atomic(&path, b"data").await.unwrap_err();
        assert!(matches!(err, NewsError::Io { .. }));
        assert!(!staging_path(&path).exists());
    }
}
