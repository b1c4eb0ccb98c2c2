//! Assembling the page collection into one output document.
//!
//! An export works on a snapshot of the collection taken when it starts, so
//! edits made while it runs never leak into the output. The snapshot is
//! walked strictly in order on tokio's blocking pool:
//!
//! 1. each distinct source is parsed once, the first time a page of it is
//!    needed, and reused for every later page of the same source;
//! 2. every page reference is validated against the parsed document;
//! 3. the page is deep-copied and given its recorded rotation.
//!
//! The first failure aborts the whole export. There is no partial output.

mod copier;
pub mod metadata;

pub use copier::{OutputDocument, SourceHandle};

use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::task;

use crate::config::{CompressionLevel, ExportOptions};
use crate::error::{PageMergeError, Result};
use crate::pages::{PageCollection, PageId, Rotation};
use crate::source::{SourceDocument, SourceId};
use crate::utils::format_file_size;

/// One page of the export snapshot.
#[derive(Debug, Clone)]
pub struct ExportItem {
    /// Record the page came from.
    pub page_id: PageId,
    /// Source document.
    pub source: Arc<SourceDocument>,
    /// Zero-based page index within the source.
    pub page_index: usize,
    /// Absolute rotation for the output page.
    pub rotation: Rotation,
}

/// Statistics about an export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportStatistics {
    /// Pages in the output document.
    pub pages: usize,

    /// Sources that were parsed, in the order they were first needed.
    pub sources_opened: Vec<SourceId>,

    /// Time spent assembling and serializing.
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,

    /// Size of the serialized output in bytes.
    pub output_size: u64,

    /// Compression applied.
    pub compression: CompressionLevel,
}

impl ExportStatistics {
    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Result of a successful export.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    /// The serialized PDF.
    pub bytes: Vec<u8>,
    /// Statistics about the export.
    pub statistics: ExportStatistics,
}

/// Turns page collections into PDF bytes.
///
/// One pipeline runs at most one export at a time; a second export started
/// while the first is still running fails with
/// [`PageMergeError::ExportInProgress`].
#[derive(Debug, Default)]
pub struct ExportPipeline {
    options: ExportOptions,
    running: Arc<AtomicBool>,
}

struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ExportPipeline {
    /// Create a pipeline with the given options.
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Export settings.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Whether an export is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<RunningGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PageMergeError::ExportInProgress)?;
        Ok(RunningGuard(Arc::clone(&self.running)))
    }

    /// Capture the collection's current order, sources and rotations.
    pub fn snapshot(collection: &PageCollection) -> Vec<ExportItem> {
        collection
            .iter()
            .map(|record| ExportItem {
                page_id: record.id(),
                source: Arc::clone(record.source()),
                page_index: record.source_page_index(),
                rotation: record.rotation(),
            })
            .collect()
    }

    /// Export the collection.
    ///
    /// # Errors
    ///
    /// - [`PageMergeError::EmptyCollection`] if there are no pages
    /// - [`PageMergeError::ExportInProgress`] if this pipeline is busy
    /// - [`PageMergeError::InvalidSourceData`],
    ///   [`PageMergeError::PageOutOfRange`] or
    ///   [`PageMergeError::PageCopyFailed`] for the first page that cannot
    ///   be copied
    pub async fn export(&self, collection: &PageCollection) -> Result<ExportOutput> {
        if collection.is_empty() {
            return Err(PageMergeError::EmptyCollection);
        }

        let _guard = self.begin()?;
        let items = Self::snapshot(collection);
        let options = self.options.clone();

        task::spawn_blocking(move || assemble(&items, &options))
            .await
            .map_err(|e| PageMergeError::other(format!("Export task failed: {e}")))?
    }
}

/// Assemble a snapshot into PDF bytes on the current thread.
///
/// # Errors
///
/// See [`ExportPipeline::export`].
pub fn assemble(items: &[ExportItem], options: &ExportOptions) -> Result<ExportOutput> {
    if items.is_empty() {
        return Err(PageMergeError::EmptyCollection);
    }

    let start = Instant::now();
    let mut handles: HashMap<SourceId, SourceHandle> = HashMap::new();
    let mut sources_opened = Vec::new();
    let mut output = OutputDocument::new();

    for item in items {
        let handle = match handles.entry(item.source.id().clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let handle = SourceHandle::open(Arc::clone(&item.source), item.page_index)?;
                sources_opened.push(entry.key().clone());
                entry.insert(handle)
            }
        };

        output.copy_page(handle, item.page_index, item.rotation)?;
    }

    let pages = output.page_count();
    let bytes = output.finish(options)?;

    let statistics = ExportStatistics {
        pages,
        sources_opened,
        elapsed: start.elapsed(),
        output_size: bytes.len() as u64,
        compression: options.compression,
    };

    tracing::info!(
        pages,
        sources = statistics.sources_opened.len(),
        size = statistics.output_size,
        elapsed_ms = statistics.elapsed.as_millis() as u64,
        "export finished"
    );

    Ok(ExportOutput { bytes, statistics })
}
