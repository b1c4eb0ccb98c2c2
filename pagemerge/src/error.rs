//! Error types for pagemerge.
//!
//! Every fallible operation in the crate returns [`PageMergeError`]. Errors
//! carry enough context (file name, 1-based page number, index) to be shown
//! to a user as-is.
//!
//! # Error Categories
//!
//! - **Import errors**: a source cannot be read or parsed. Recovered per file.
//! - **Render errors**: a page cannot be rasterized. Recorded on the page.
//! - **Export errors**: anything that goes wrong while assembling the output.
//!   Always fatal to the export as a whole.
//! - **Model errors**: invalid ids, indices or rotations.
//! - **I/O and configuration errors**: the usual suspects around the CLI.

use std::io;
use std::path::PathBuf;

use crate::pages::PageId;

/// Result type alias for pagemerge operations.
pub type Result<T> = std::result::Result<T, PageMergeError>;

/// Main error type for pagemerge operations.
#[derive(Debug, thiserror::Error)]
pub enum PageMergeError {
    /// A source document could not be opened while importing.
    #[error("Failed to import {file}\n  Reason: {reason}")]
    ImportFailed {
        /// Name of the source file.
        file: String,
        /// Reason for the failure.
        reason: String,
    },

    /// An input was not recognized as a PDF and was filtered out.
    #[error("Not a PDF document: {file}")]
    UnsupportedMediaType {
        /// Name of the skipped file.
        file: String,
    },

    /// A page could not be rendered to a bitmap.
    #[error("Failed to render page {page} of {file}\n  Reason: {reason}")]
    RenderFailed {
        /// Name of the source file.
        file: String,
        /// 1-based page number within the source.
        page: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// Export was requested for a collection without pages.
    #[error("There are no pages to export")]
    EmptyCollection,

    /// Another export is still running on the same pipeline.
    #[error("An export is already in progress")]
    ExportInProgress,

    /// A source's bytes are empty or cannot be parsed at export time.
    #[error("Invalid source data for {file} (needed for page {page})\n  Reason: {reason}")]
    InvalidSourceData {
        /// Name of the source file.
        file: String,
        /// 1-based page whose copy required the source.
        page: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// A page record points past the end of its source document.
    #[error(
        "Page {page} of {file} does not exist\n  \
         The document has {page_count} page(s)"
    )]
    PageOutOfRange {
        /// Name of the source file.
        file: String,
        /// 1-based page number that was requested.
        page: usize,
        /// Actual number of pages in the source.
        page_count: usize,
    },

    /// Copying a page into the output document failed.
    #[error("Failed to copy page {page} of {file}\n  Reason: {reason}")]
    PageCopyFailed {
        /// Name of the source file.
        file: String,
        /// 1-based page number within the source.
        page: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// No page with the given id exists in the collection.
    #[error("No page with id {id}")]
    PageNotFound {
        /// The id that was looked up.
        id: PageId,
    },

    /// A position does not address a page in the collection.
    #[error("Position {index} is out of range for a collection of {len} page(s)")]
    IndexOutOfRange {
        /// Zero-based index that was requested.
        index: usize,
        /// Current collection length.
        len: usize,
    },

    /// A rotation that is not a multiple of 90 degrees.
    #[error("Invalid rotation: {degrees}. Must be a multiple of 90")]
    InvalidRotation {
        /// Degrees that were requested.
        degrees: i64,
    },

    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input file is not accessible (permission denied, etc.).
    #[error("Cannot access file: {}\n  Reason: {source}", path.display())]
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  \
         Use --force to overwrite or choose a different output path",
        path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to read input list file.
    #[error("Failed to read input list file: {}\n  Reason: {source}", path.display())]
    FailedToReadInputList {
        /// Path to the input list file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Input list file contains invalid paths.
    #[error(
        "Invalid entry in input list file: {} at line {line_number}\n  Details: {details}",
        path.display()
    )]
    InvalidInputList {
        /// Path to the input list file.
        path: PathBuf,
        /// Line number with the error.
        line_number: usize,
        /// Details about what's invalid.
        details: String,
    },

    /// An edit command could not be parsed or applied.
    #[error("Invalid edit '{edit}': {reason}")]
    InvalidEdit {
        /// The edit as given by the user.
        edit: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for PageMergeError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<image::ImageError> for PageMergeError {
    fn from(err: image::ImageError) -> Self {
        Self::other(err.to_string())
    }
}

impl From<anyhow::Error> for PageMergeError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl PageMergeError {
    /// Create an ImportFailed error.
    pub fn import_failed(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ImportFailed {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Create a RenderFailed error. `page_index` is zero-based.
    pub fn render_failed(
        file: impl Into<String>,
        page_index: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::RenderFailed {
            file: file.into(),
            page: page_index + 1,
            reason: reason.into(),
        }
    }

    /// Create an InvalidSourceData error. `page_index` is zero-based.
    pub fn invalid_source_data(
        file: impl Into<String>,
        page_index: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidSourceData {
            file: file.into(),
            page: page_index + 1,
            reason: reason.into(),
        }
    }

    /// Create a PageOutOfRange error. `page_index` is zero-based.
    pub fn page_out_of_range(
        file: impl Into<String>,
        page_index: usize,
        page_count: usize,
    ) -> Self {
        Self::PageOutOfRange {
            file: file.into(),
            page: page_index + 1,
            page_count,
        }
    }

    /// Create a PageCopyFailed error. `page_index` is zero-based.
    pub fn page_copy_failed(
        file: impl Into<String>,
        page_index: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::PageCopyFailed {
            file: file.into(),
            page: page_index + 1,
            reason: reason.into(),
        }
    }

    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an InvalidEdit error.
    pub fn invalid_edit(edit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEdit {
            edit: edit.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Name of the source file involved, if the error is about one.
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::ImportFailed { file, .. }
            | Self::UnsupportedMediaType { file }
            | Self::RenderFailed { file, .. }
            | Self::InvalidSourceData { file, .. }
            | Self::PageOutOfRange { file, .. }
            | Self::PageCopyFailed { file, .. } => Some(file),
            _ => None,
        }
    }

    /// 1-based page number involved, if the error is about a single page.
    pub fn page(&self) -> Option<usize> {
        match self {
            Self::RenderFailed { page, .. }
            | Self::InvalidSourceData { page, .. }
            | Self::PageOutOfRange { page, .. }
            | Self::PageCopyFailed { page, .. } => Some(*page),
            _ => None,
        }
    }

    /// Check if this error is recoverable (processing of other items can continue).
    ///
    /// Import and render failures only affect a single file or page.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ImportFailed { .. }
                | Self::UnsupportedMediaType { .. }
                | Self::RenderFailed { .. }
                | Self::FileNotFound { .. }
                | Self::FileNotAccessible { .. }
        )
    }

    /// Check if this error should stop all processing immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidSourceData { .. }
                | Self::PageOutOfRange { .. }
                | Self::PageCopyFailed { .. }
                | Self::FailedToCreateOutput { .. }
                | Self::FailedToWrite { .. }
                | Self::Cancelled
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::FileNotAccessible { .. } => 2,
            Self::FailedToReadInputList { .. } => 2,
            Self::ImportFailed { .. } => 3,
            Self::UnsupportedMediaType { .. } => 3,
            Self::InvalidSourceData { .. } => 3,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::Io { .. } => 5,
            Self::PageOutOfRange { .. } => 6,
            Self::PageCopyFailed { .. } => 6,
            Self::RenderFailed { .. } => 6,
            Self::ExportInProgress => 6,
            Self::EmptyCollection => 1,
            Self::PageNotFound { .. } => 1,
            Self::IndexOutOfRange { .. } => 1,
            Self::InvalidRotation { .. } => 1,
            Self::InvalidInputList { .. } => 1,
            Self::InvalidEdit { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::Cancelled => 130,
            Self::Other { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_page_out_of_range_display() {
        let err = PageMergeError::page_out_of_range("report.pdf", 4, 3);
        let msg = format!("{err}");
        assert!(msg.contains("Page 5"));
        assert!(msg.contains("report.pdf"));
        assert!(msg.contains("3 page(s)"));
        assert_eq!(err.file(), Some("report.pdf"));
        assert_eq!(err.page(), Some(5));
    }

    #[test]
    fn test_invalid_source_data_display() {
        let err = PageMergeError::invalid_source_data("empty.pdf", 2, "no bytes");
        let msg = format!("{err}");
        assert!(msg.contains("empty.pdf"));
        assert!(msg.contains("page 3"));
        assert!(msg.contains("no bytes"));
        assert_eq!(err.page(), Some(3));
    }

    #[test]
    fn test_output_exists_display() {
        let err = PageMergeError::output_exists(PathBuf::from("merged.pdf"));
        let msg = format!("{err}");
        assert!(msg.contains("already exists"));
        assert!(msg.contains("--force"));
    }

    #[test]
    fn test_render_failed_uses_one_based_page() {
        let err = PageMergeError::render_failed("a.pdf", 0, "broken");
        assert!(matches!(err, PageMergeError::RenderFailed { page: 1, .. }));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(PageMergeError::import_failed("bad.pdf", "error").is_recoverable());
        assert!(PageMergeError::render_failed("bad.pdf", 2, "error").is_recoverable());
        assert!(!PageMergeError::EmptyCollection.is_recoverable());
        assert!(!PageMergeError::page_out_of_range("a.pdf", 9, 2).is_recoverable());
    }

    #[test]
    fn test_is_fatal() {
        assert!(PageMergeError::page_out_of_range("a.pdf", 9, 2).is_fatal());
        assert!(PageMergeError::invalid_source_data("a.pdf", 0, "x").is_fatal());
        assert!(PageMergeError::Cancelled.is_fatal());
        assert!(!PageMergeError::import_failed("bad.pdf", "error").is_fatal());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(PageMergeError::EmptyCollection.exit_code(), 1);
        assert_eq!(
            PageMergeError::file_not_found(PathBuf::from("x")).exit_code(),
            2
        );
        assert_eq!(
            PageMergeError::output_exists(PathBuf::from("x")).exit_code(),
            4
        );
        assert_eq!(PageMergeError::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let err: PageMergeError = io_err.into();
        assert!(matches!(err, PageMergeError::Io { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_source() {
        let err = PageMergeError::FileNotAccessible {
            path: PathBuf::from("test.pdf"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(PageMergeError::EmptyCollection.source().is_none());
    }
}
