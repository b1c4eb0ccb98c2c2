//! Reading input files into import batches.
//!
//! The reader turns paths into [`ImportFile`]s in the order given. It does
//! not parse anything; it only reads bytes and drops inputs that are not
//! PDFs, reporting them as skipped.
//!
//! # Examples
//!
//! ```no_run
//! use pagemerge::io::reader::SourceReader;
//! use std::path::PathBuf;
//!
//! # async fn example() {
//! let reader = SourceReader::new();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let loaded = reader.load_all(&paths).await;
//! println!("{} file(s) ready, {} skipped", loaded.files.len(), loaded.skipped.len());
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{PageMergeError, Result};
use crate::utils::format_file_size;
use crate::validation::MediaType;
use crate::workspace::ImportFile;

/// An input that was not handed to the workspace.
#[derive(Debug)]
pub struct SkippedInput {
    /// Path as given.
    pub path: PathBuf,
    /// Why it was skipped.
    pub error: PageMergeError,
}

/// Statistics for a batch read.
#[derive(Debug, Clone, Default)]
pub struct LoadStatistics {
    /// Files read and accepted.
    pub loaded: usize,

    /// Files skipped (unreadable or not a PDF).
    pub skipped: usize,

    /// Bytes read from accepted files.
    pub total_size: u64,

    /// Time taken for the whole batch.
    pub total_time: Duration,
}

impl LoadStatistics {
    /// Format total size as human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Outcome of [`SourceReader::load_all`].
#[derive(Debug, Default)]
pub struct LoadedInputs {
    /// Accepted files, in input order.
    pub files: Vec<ImportFile>,
    /// Rejected inputs, in input order.
    pub skipped: Vec<SkippedInput>,
    /// Batch statistics.
    pub statistics: LoadStatistics,
}

/// Reads input files with tokio's async filesystem API.
#[derive(Debug, Clone)]
pub struct SourceReader {
    /// Whether to drop inputs that are not PDFs.
    filter: bool,
}

impl SourceReader {
    /// Create a reader that filters out non-PDF inputs.
    pub fn new() -> Self {
        Self { filter: true }
    }

    /// Create a reader that passes every file through; the workspace then
    /// reports unparseable ones as failed imports.
    pub fn without_filter() -> Self {
        Self { filter: false }
    }

    /// Read one file.
    ///
    /// The import name is the file name component of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - Filtering is on and the file is not a PDF
    pub async fn load(&self, path: &Path) -> Result<ImportFile> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PageMergeError::file_not_found(path.to_path_buf())
            } else {
                PageMergeError::FileNotAccessible {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let name = display_name(path);
        if self.filter && !MediaType::detect(path, &bytes).is_pdf() {
            return Err(PageMergeError::UnsupportedMediaType { file: name });
        }

        tracing::debug!(file = %name, size = bytes.len(), "input read");
        Ok(ImportFile::new(name, bytes))
    }

    /// Read every path sequentially, in order.
    ///
    /// Failures do not stop the batch; they are collected in
    /// [`LoadedInputs::skipped`].
    pub async fn load_all(&self, paths: &[PathBuf]) -> LoadedInputs {
        let start = Instant::now();
        let mut loaded = LoadedInputs::default();

        for path in paths {
            match self.load(path).await {
                Ok(file) => {
                    loaded.statistics.total_size += file.bytes.len() as u64;
                    loaded.files.push(file);
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "input skipped");
                    loaded.skipped.push(SkippedInput {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }

        loaded.statistics.loaded = loaded.files.len();
        loaded.statistics.skipped = loaded.skipped.len();
        loaded.statistics.total_time = start.elapsed();
        loaded
    }
}

impl Default for SourceReader {
    fn default() -> Self {
        Self::new()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::pdf::fixtures::pdf_with_pages;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_uses_file_name() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "report.pdf", &pdf_with_pages(1, 100, &[]));

        let file = SourceReader::new().load(&path).await.unwrap();

        assert_eq!(file.name, "report.pdf");
        assert!(file.bytes.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let err = SourceReader::new()
            .load(Path::new("/nonexistent.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PageMergeError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_load_all_filters_and_keeps_order() {
        let dir = TempDir::new().unwrap();
        let b = write(&dir, "b.pdf", &pdf_with_pages(1, 100, &[]));
        let notes = write(&dir, "notes.txt", b"just text");
        let a = write(&dir, "a.pdf", &pdf_with_pages(2, 100, &[]));

        let loaded = SourceReader::new().load_all(&[b, notes, a]).await;

        let names: Vec<_> = loaded.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b.pdf", "a.pdf"]);
        assert_eq!(loaded.skipped.len(), 1);
        assert!(matches!(
            loaded.skipped[0].error,
            PageMergeError::UnsupportedMediaType { ref file } if file == "notes.txt"
        ));
        assert_eq!(loaded.statistics.loaded, 2);
        assert_eq!(loaded.statistics.skipped, 1);
    }

    #[tokio::test]
    async fn test_sniffed_pdf_without_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "download", &pdf_with_pages(1, 100, &[]));

        assert!(SourceReader::new().load(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_without_filter_passes_everything() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "notes.txt", b"just text");

        let file = SourceReader::without_filter().load(&path).await.unwrap();
        assert_eq!(file.bytes, b"just text");
    }
}
