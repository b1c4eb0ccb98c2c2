//! Writing the exported document and thumbnails to disk.
//!
//! This module provides safe output writing with:
//! - Atomic writes (write to a temp file, then rename)
//! - Pre-flight checks for the output location
//! - PNG export of rendered thumbnails
//! - Write statistics
//!
//! # Examples
//!
//! ```no_run
//! use pagemerge::io::writer::OutputWriter;
//! use std::path::Path;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = OutputWriter::new();
//! let stats = writer.save(bytes, Path::new("merged.pdf")).await?;
//! println!("Wrote {}", stats.format_file_size());
//! # Ok(())
//! # }
//! ```

use image::RgbaImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{PageMergeError, Result};
use crate::utils::format_file_size;

/// Options for writing output files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Use atomic writes (write to temp file, then rename).
    pub atomic: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            buffer_size: 64 * 1024,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Output writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct OutputWriter {
    options: WriteOptions,
}

impl OutputWriter {
    /// Create a new writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Create a writer without atomic writes.
    pub fn non_atomic() -> Self {
        Self {
            options: WriteOptions {
                atomic: false,
                ..Default::default()
            },
        }
    }

    /// Save bytes to `path` and return statistics about the operation.
    ///
    /// With atomic writes a reader never observes a half-written file: the
    /// bytes go to a sibling temp file that is renamed over `path` once
    /// flushed. The temp file is removed if anything fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be created
    /// - Writing or flushing fails
    /// - The final rename fails
    pub async fn save(
        &self,
        bytes: impl Into<Arc<[u8]>>,
        path: &Path,
    ) -> Result<WriteStatistics> {
        let bytes: Arc<[u8]> = bytes.into();
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        task::spawn_blocking(move || {
            let start = Instant::now();

            let write_path = if options.atomic {
                temp_path_for(&path_buf)
            } else {
                path_buf.clone()
            };

            let result = write_file(&write_path, &bytes, options.buffer_size).and_then(|()| {
                if options.atomic {
                    std::fs::rename(&write_path, &path_buf).map_err(|e| {
                        PageMergeError::FailedToWrite {
                            path: path_buf.clone(),
                            source: e,
                        }
                    })?;
                }
                Ok(())
            });

            if let Err(err) = result {
                if options.atomic {
                    std::fs::remove_file(&write_path).ok();
                }
                return Err(err);
            }

            let file_size = std::fs::metadata(&path_buf)
                .map(|m| m.len())
                .unwrap_or(bytes.len() as u64);

            tracing::debug!(path = %path_buf.display(), size = file_size, "output written");
            Ok(WriteStatistics {
                write_time: start.elapsed(),
                file_size,
                output_path: path_buf,
            })
        })
        .await
        .map_err(|e| PageMergeError::other(format!("Write task failed: {e}")))?
    }

    /// Save a bitmap as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::FailedToWrite`] if encoding or writing fails.
    pub async fn save_png(&self, bitmap: Arc<RgbaImage>, path: &Path) -> Result<()> {
        let path_buf = path.to_path_buf();

        task::spawn_blocking(move || {
            bitmap
                .save_with_format(&path_buf, image::ImageFormat::Png)
                .map_err(|e| PageMergeError::FailedToWrite {
                    path: path_buf.clone(),
                    source: std::io::Error::other(e),
                })
        })
        .await
        .map_err(|e| PageMergeError::other(format!("Write task failed: {e}")))?
    }

    /// Check if a file can be written to the given path.
    ///
    /// Performs pre-flight checks without actually writing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory doesn't exist
    /// - Parent directory is not writable
    pub async fn can_write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            let metadata = tokio::fs::metadata(parent).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PageMergeError::invalid_config(format!(
                        "Output directory does not exist: {}",
                        parent.display()
                    ))
                } else {
                    PageMergeError::FileNotAccessible {
                        path: parent.to_path_buf(),
                        source: e,
                    }
                }
            })?;

            if metadata.permissions().readonly() {
                return Err(PageMergeError::invalid_config(format!(
                    "Output directory is not writable: {}",
                    parent.display()
                )));
            }
        }

        Ok(())
    }

    /// Check if output file exists.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }
}

fn write_file(path: &Path, bytes: &[u8], buffer_size: usize) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| PageMergeError::FailedToCreateOutput {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);
    writer
        .write_all(bytes)
        .and_then(|()| writer.flush())
        .map_err(|e| PageMergeError::FailedToWrite {
            path: path.to_path_buf(),
            source: e,
        })
}

/// `merged.pdf` -> `.merged.pdf.tmp` in the same directory, so the rename
/// never crosses filesystems.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
