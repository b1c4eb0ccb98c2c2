//! Utilities for path collection, size formatting, and PDF page helpers.

pub mod pdf;

use crate::{Result, error::PageMergeError};
use std::path::PathBuf;

/// Expand multiple glob patterns into filesystem paths.
///
/// Accepts anything iterable with items that convert to `&str`, e.g.:
/// `&[&str]`, `Vec<String>`, or `Vec<&str>`.
///
/// A pattern without glob metacharacters that matches nothing is kept as a
/// literal path, so a missing file is reported as missing rather than
/// silently dropped.
///
/// Errors:
/// - Propagates `glob` parse errors.
/// - Propagates filesystem errors from glob iterator.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns.into_iter() {
        let pattern = pattern.as_ref();
        let paths = collect_paths_for_pattern(pattern)?;
        if paths.is_empty() && !is_glob(pattern) {
            resolved_paths.push(PathBuf::from(pattern));
        } else {
            resolved_paths.extend(paths);
        }
    }

    Ok(resolved_paths)
}

/// Expand a single glob pattern into filesystem paths.
///
/// Pattern examples:
/// - `"**/*.pdf"`
/// - `"./scans/*.pdf"`
fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut resolved_paths = Vec::new();

    let paths = glob::glob(pattern).map_err(|err| PageMergeError::Other {
        message: err.to_string(),
    })?;

    for entry in paths {
        let path = entry.map_err(|err| PageMergeError::Other {
            message: err.to_string(),
        })?;
        resolved_paths.push(path);
    }

    Ok(resolved_paths)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Format a byte count as a human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(500), "500 bytes");
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(1536 * 1024), "1.50 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1.00 GB");
    }

    #[test]
    fn test_collect_paths_expands_globs_in_order() {
        let dir = TempDir::new().unwrap();
        for name in ["b.pdf", "a.pdf", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let pattern = format!("{}/*.pdf", dir.path().display());

        let paths = collect_paths_for_patterns([pattern.as_str()]).unwrap();

        assert_eq!(
            paths,
            vec![dir.path().join("a.pdf"), dir.path().join("b.pdf")]
        );
    }

    #[test]
    fn test_collect_paths_keeps_missing_literal() {
        let paths = collect_paths_for_patterns(["/nonexistent/report.pdf"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("/nonexistent/report.pdf")]);
    }

    #[test]
    fn test_collect_paths_drops_unmatched_glob() {
        let paths = collect_paths_for_patterns(["/nonexistent/*.pdf"]).unwrap();
        assert!(paths.is_empty());
    }
}
