//! Import inputs and reports.

use serde::Serialize;
use std::time::Duration;

use crate::error::PageMergeError;
use crate::pages::{PageId, Rotation};
use crate::source::SourceId;
use crate::utils::pdf;

/// One file handed to [`Workspace::import`](super::Workspace::import).
#[derive(Debug, Clone)]
pub struct ImportFile {
    /// File name used for display and error messages.
    pub name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl ImportFile {
    /// Create an import file.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A source that was imported.
#[derive(Debug, Clone, Serialize)]
pub struct ImportedSource {
    /// File name as given.
    pub name: String,
    /// Content identity.
    pub source: SourceId,
    /// Number of pages appended.
    pub pages: usize,
    /// Ids of the appended records, in source order.
    pub page_ids: Vec<PageId>,
    /// Whether the same content had been imported before.
    pub duplicate: bool,
}

/// A file that could not be imported.
#[derive(Debug, Clone, Serialize)]
pub struct ImportFailure {
    /// File name as given.
    pub file: String,
    /// Why the import failed.
    pub reason: String,
}

impl From<&PageMergeError> for ImportFailure {
    fn from(err: &PageMergeError) -> Self {
        let reason = match err {
            PageMergeError::ImportFailed { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self {
            file: err.file().unwrap_or_default().to_string(),
            reason,
        }
    }
}

/// Outcome of an import batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Imported sources, in input order.
    pub imported: Vec<ImportedSource>,
    /// Files that failed, in input order.
    pub failed: Vec<ImportFailure>,
    /// Thumbnails rendered successfully.
    pub thumbnails_rendered: usize,
    /// Thumbnails the renderer rejected.
    pub thumbnails_failed: usize,
    /// Wall time for the whole batch.
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ImportReport {
    /// Total pages appended by this batch.
    pub fn pages_added(&self) -> usize {
        self.imported.iter().map(|s| s.pages).sum()
    }

    /// Ids of every appended record, in collection order.
    pub fn page_ids(&self) -> Vec<PageId> {
        self.imported
            .iter()
            .flat_map(|s| s.page_ids.iter().copied())
            .collect()
    }

    /// Whether every file imported.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Parse a document and read the declared rotation of every page.
///
/// The number of rotations is the page count.
pub(crate) fn inspect(bytes: &[u8]) -> Result<Vec<Rotation>, String> {
    if bytes.is_empty() {
        return Err("the file is empty".to_string());
    }

    let doc = pdf::load_document(bytes).map_err(|e| e.to_string())?;
    let rotations: Vec<Rotation> = pdf::page_ids(&doc)
        .into_iter()
        .map(|page| pdf::declared_rotation(&doc, page))
        .collect();

    if rotations.is_empty() {
        return Err("the document has no pages".to_string());
    }
    Ok(rotations)
}
