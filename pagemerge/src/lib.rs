//! pagemerge - Assemble a new PDF from pages of other PDFs.
//!
//! The library is the page-collection and merge-export engine behind the
//! `pagemerge` command. It supports:
//!
//! - Importing source documents, deduplicated by content
//! - An ordered, editable page collection (reorder, rotate, remove, clear)
//! - Concurrent thumbnail rendering through a pluggable [`PageRenderer`]
//! - An enlarged single-page preview with navigation
//! - Exporting the current page order as a single PDF
//!
//! # Examples
//!
//! ## Import, edit, export
//!
//! ```no_run
//! use pagemerge::config::WorkspaceOptions;
//! use pagemerge::io::{OutputWriter, SourceReader};
//! use pagemerge::workspace::{Command, Workspace};
//! use std::path::{Path, PathBuf};
//!
//! # async fn example() -> pagemerge::Result<()> {
//! let reader = SourceReader::new();
//! let loaded = reader
//!     .load_all(&[PathBuf::from("a.pdf"), PathBuf::from("b.pdf")])
//!     .await;
//!
//! let mut workspace = Workspace::new(WorkspaceOptions::default())?;
//! let report = workspace.import(loaded.files).await;
//! println!("Imported {} pages", report.pages_added());
//!
//! workspace.apply(Command::Move { from: 0, to: 2 }).await?;
//! workspace.apply(Command::RotateAll { degrees: 90 }).await?;
//!
//! let output = workspace.export().await?;
//! OutputWriter::new()
//!     .save(output.bytes, Path::new("merged.pdf"))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`PageRenderer`]: render::PageRenderer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod export;
pub mod io;
pub mod output;
pub mod pages;
pub mod preview;
pub mod render;
pub mod source;
pub mod utils;
pub mod validation;
pub mod workspace;

// Re-export commonly used types
pub use config::{Config, WorkspaceOptions};
pub use error::{PageMergeError, Result};
pub use workspace::Workspace;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
