//! Input and output checks for the command-line front end.
//!
//! This module decides which inputs are PDFs at all (by extension or by
//! sniffing the header) and performs the pre-flight checks that run before
//! anything is imported:
//! - Input existence and file type
//! - Output overwrite policy
//! - Output directory existence and permissions
//!
//! Whether a PDF actually parses is not checked here; that is reported per
//! file by [`Workspace::import`](crate::workspace::Workspace::import).
//!
//! # Examples
//!
//! ```no_run
//! use pagemerge::validation::Validator;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let validator = Validator::new();
//! validator.validate_inputs(&[PathBuf::from("a.pdf")], false).await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use crate::config::{Config, OverwriteMode};
use crate::error::{PageMergeError, Result};
use crate::io::OutputWriter;

/// Header every PDF file starts with.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// How far into a file the header may appear. Readers tolerate leading
/// garbage before `%PDF-` up to this offset.
const SNIFF_WINDOW: usize = 1024;

/// Media type of an input, as far as import is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// `application/pdf`.
    Pdf,
    /// Anything else.
    Unsupported,
}

impl MediaType {
    /// Classify an input by its file name and leading bytes.
    ///
    /// A `.pdf` extension is trusted as-is, mirroring how a browser assigns
    /// `application/pdf`. Other files are accepted only if the PDF header
    /// appears near the start.
    pub fn detect(path: &Path, bytes: &[u8]) -> Self {
        if has_pdf_extension(path) || has_pdf_header(bytes) {
            Self::Pdf
        } else {
            Self::Unsupported
        }
    }

    /// Whether the input should be imported.
    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

/// Whether the path ends in `.pdf`, ignoring case.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Whether `%PDF-` appears within the first kilobyte.
pub fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    window
        .windows(PDF_MAGIC.len())
        .any(|candidate| candidate == PDF_MAGIC)
}

/// Pre-flight validator for paths.
#[derive(Debug, Clone, Default)]
pub struct Validator;

impl Validator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self
    }

    /// Check that a single input exists and is a regular file.
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::FileNotFound`] if nothing exists at `path`,
    /// [`PageMergeError::FileNotAccessible`] if its metadata cannot be read,
    /// and [`PageMergeError::InvalidConfig`] for directories.
    pub async fn validate_input(&self, path: &Path) -> Result<()> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PageMergeError::file_not_found(path.to_path_buf())
            } else {
                PageMergeError::FileNotAccessible {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        if !metadata.is_file() {
            return Err(PageMergeError::invalid_config(format!(
                "Not a file: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Check every input.
    ///
    /// With `continue_on_error`, inputs that fail with a recoverable error
    /// (missing or unreadable files) are logged and counted instead of
    /// stopping the check. Returns how many inputs were tolerated that way.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`Validator::validate_input`] that is
    /// not tolerated.
    pub async fn validate_inputs(
        &self,
        paths: &[PathBuf],
        continue_on_error: bool,
    ) -> Result<usize> {
        let mut tolerated = 0;

        for path in paths {
            match self.validate_input(path).await {
                Ok(()) => {}
                Err(e) if continue_on_error && e.is_recoverable() => {
                    tracing::warn!(path = %path.display(), error = %e, "input will be skipped");
                    tolerated += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(tolerated)
    }

    /// Check that the output can be written under the configured policy.
    ///
    /// An existing output is only an error with
    /// [`OverwriteMode::NoClobber`]; prompting is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The output exists and no-clobber is set
    /// - The output path is a directory
    /// - The output directory does not exist
    /// - The output directory is read-only
    pub async fn validate_output(&self, config: &Config) -> Result<()> {
        let output = &config.output;
        let writer = OutputWriter::new();

        if config.overwrite_mode == OverwriteMode::NoClobber && writer.exists(output).await {
            return Err(PageMergeError::output_exists(output.clone()));
        }

        if output.is_dir() {
            return Err(PageMergeError::invalid_config(format!(
                "Output path is a directory: {}",
                output.display()
            )));
        }

        writer.can_write(output).await
    }

    /// Validate inputs, then output.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub async fn validate_config(&self, config: &Config) -> Result<()> {
        self.validate_inputs(config.inputs(), config.continue_on_error)
            .await?;
        if config.writes_output() {
            self.validate_output(config).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_OUTPUT, WorkspaceOptions};
    use rstest::rstest;
    use tempfile::TempDir;

    fn config(inputs: Vec<PathBuf>, output: PathBuf, mode: OverwriteMode) -> Config {
        Config {
            inputs,
            output,
            dry_run: false,
            list: false,
            verbose: false,
            quiet: true,
            json: false,
            overwrite_mode: mode,
            continue_on_error: false,
            edits: Vec::new(),
            thumbnails_dir: None,
            workspace: WorkspaceOptions::default(),
        }
    }

    #[rstest]
    #[case("scan.pdf", b"junk".as_slice(), MediaType::Pdf)]
    #[case("SCAN.PDF", b"".as_slice(), MediaType::Pdf)]
    #[case("scan", b"%PDF-1.7\n".as_slice(), MediaType::Pdf)]
    #[case("notes.txt", b"\x00\x00%PDF-1.4".as_slice(), MediaType::Pdf)]
    #[case("notes.txt", b"hello".as_slice(), MediaType::Unsupported)]
    #[case("image.png", b"\x89PNG\r\n".as_slice(), MediaType::Unsupported)]
    fn test_detect_media_type(
        #[case] name: &str,
        #[case] bytes: &[u8],
        #[case] expected: MediaType,
    ) {
        assert_eq!(MediaType::detect(Path::new(name), bytes), expected);
    }

    #[test]
    fn test_header_beyond_window_is_ignored() {
        let mut bytes = vec![b' '; SNIFF_WINDOW];
        bytes.extend_from_slice(PDF_MAGIC);
        assert!(!has_pdf_header(&bytes));
    }

    #[tokio::test]
    async fn test_validate_missing_input() {
        let err = Validator::new()
            .validate_input(Path::new("/nonexistent/a.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PageMergeError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_validate_directory_input() {
        let dir = TempDir::new().unwrap();
        let err = Validator::new()
            .validate_input(dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, PageMergeError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn test_validate_inputs_continue_on_error() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("a.pdf");
        std::fs::write(&present, b"%PDF-1.4").unwrap();
        let inputs = vec![PathBuf::from("/nonexistent/b.pdf"), present];

        let validator = Validator::new();
        let err = validator.validate_inputs(&inputs, false).await.unwrap_err();
        assert!(matches!(err, PageMergeError::FileNotFound { .. }));
        assert_eq!(validator.validate_inputs(&inputs, true).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_directory_input_is_never_tolerated() {
        let dir = TempDir::new().unwrap();
        let err = Validator::new()
            .validate_inputs(&[dir.path().to_path_buf()], true)
            .await
            .unwrap_err();
        assert!(matches!(err, PageMergeError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn test_validate_output_no_clobber() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join(DEFAULT_OUTPUT);
        std::fs::write(&output, b"old").unwrap();

        let validator = Validator::new();
        let err = validator
            .validate_output(&config(vec![], output.clone(), OverwriteMode::NoClobber))
            .await
            .unwrap_err();
        assert!(matches!(err, PageMergeError::OutputExists { .. }));

        assert!(
            validator
                .validate_output(&config(vec![], output, OverwriteMode::Force))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_validate_output_missing_directory() {
        let err = Validator::new()
            .validate_output(&config(
                vec![],
                PathBuf::from("/nonexistent/dir/merged.pdf"),
                OverwriteMode::Force,
            ))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_validate_output_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = Validator::new()
            .validate_output(&config(vec![], dir.path().to_path_buf(), OverwriteMode::Force))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("is a directory"));
    }

    #[tokio::test]
    async fn test_validate_config_skips_output_on_dry_run() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.pdf");
        std::fs::write(&input, b"%PDF-1.4").unwrap();

        let mut config = config(
            vec![input],
            PathBuf::from("/nonexistent/merged.pdf"),
            OverwriteMode::Prompt,
        );
        config.dry_run = true;

        assert!(Validator::new().validate_config(&config).await.is_ok());
    }
}
