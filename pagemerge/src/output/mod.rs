//! Output formatting and display for pagemerge.
//!
//! This module handles all user-facing output including:
//! - Formatted status messages
//! - The page plan (what will be exported, in which order)
//! - Import, edit and export reports
//! - The machine-readable run summary
//!
//! # Examples
//!
//! ```no_run
//! use pagemerge::output::{OutputFormatter, display_page_plan, page_plan};
//! use pagemerge::Workspace;
//!
//! # fn example(workspace: &Workspace) {
//! let formatter = OutputFormatter::new(false, false);
//! display_page_plan(&formatter, &page_plan(workspace.collection()));
//! # }
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use serde::Serialize;
use std::path::PathBuf;

use crate::export::ExportStatistics;
use crate::io::LoadStatistics;
use crate::pages::{PageCollection, PageId, Rotation, ThumbnailState};
use crate::workspace::{Event, ImportReport};

/// One line of the page plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    /// 1-based output position.
    pub position: usize,
    /// Record id.
    pub id: PageId,
    /// Source file name.
    pub file: String,
    /// 1-based page number within the source.
    pub page: usize,
    /// Pages in the source.
    pub page_count: usize,
    /// Absolute rotation in degrees.
    pub rotation: Rotation,
    /// `"ready"`, `"pending"` or `"failed"`.
    pub thumbnail: &'static str,
}

impl PlanEntry {
    fn line(&self) -> String {
        let mut line = format!("{} p{}/{}", self.file, self.page, self.page_count);
        if self.rotation != Rotation::None {
            line.push_str(&format!("  ↻{}", self.rotation));
        }
        if self.thumbnail == "failed" {
            line.push_str("  (no preview)");
        }
        line
    }
}

/// Snapshot of the collection in export order.
pub fn page_plan(collection: &PageCollection) -> Vec<PlanEntry> {
    collection
        .iter()
        .enumerate()
        .map(|(index, record)| PlanEntry {
            position: index + 1,
            id: record.id(),
            file: record.source().name().to_string(),
            page: record.source_page_number(),
            page_count: record.source_page_count(),
            rotation: record.rotation(),
            thumbnail: match record.thumbnail() {
                ThumbnailState::Pending => "pending",
                ThumbnailState::Ready { .. } => "ready",
                ThumbnailState::Failed { .. } => "failed",
            },
        })
        .collect()
}

/// Names of the sources the collection draws pages from, in first-use
/// order.
pub fn plan_sources(collection: &PageCollection) -> Vec<String> {
    collection
        .distinct_sources()
        .iter()
        .map(|source| source.name().to_string())
        .collect()
}

/// Print the page plan as a numbered list.
pub fn display_page_plan(formatter: &OutputFormatter, plan: &[PlanEntry]) {
    if plan.is_empty() {
        formatter.info("The page collection is empty");
        return;
    }

    formatter.section(&format!("Page plan ({} page(s))", plan.len()));
    for entry in plan {
        formatter.list_item(entry.position, &entry.line());
    }
}

/// Display load statistics to the user.
pub fn display_load_statistics(formatter: &OutputFormatter, stats: &LoadStatistics) {
    if stats.skipped > 0 {
        formatter.warning(&format!("Skipped {} input(s)", stats.skipped));
    }

    formatter.debug(&format!(
        "Read {} file(s) in {:.2}s: {}",
        stats.loaded,
        stats.total_time.as_secs_f64(),
        stats.format_total_size()
    ));
}

/// Display the outcome of an import batch.
pub fn display_import_report(formatter: &OutputFormatter, report: &ImportReport) {
    for failure in &report.failed {
        formatter.warning(&format!(
            "Could not import {}: {}",
            failure.file, failure.reason
        ));
    }

    for source in &report.imported {
        let note = if source.duplicate {
            " (same content as an earlier file)"
        } else {
            ""
        };
        formatter.debug(&format!(
            "{}: {} page(s), {}{note}",
            source.name,
            source.pages,
            source.source.short()
        ));
    }

    if report.thumbnails_failed > 0 {
        formatter.warning(&format!(
            "{} page(s) could not be rendered",
            report.thumbnails_failed
        ));
    }

    formatter.info(&format!(
        "Imported {} file(s), {} page(s) in {:.2}s",
        report.imported.len(),
        report.pages_added(),
        report.elapsed.as_secs_f64()
    ));
}

/// One-line description of what a command did.
pub fn describe_event(event: &Event) -> String {
    match event {
        Event::Removed { ids } => format!("Removed {} page(s)", ids.len()),
        Event::Moved { id, from, to } => {
            format!("Moved page {id} from position {} to {}", from + 1, to + 1)
        }
        Event::Rotated { pages } => match pages.as_slice() {
            [(id, rotation)] => format!("Page {id} is now rotated {rotation}"),
            pages => format!("Rotated {} page(s)", pages.len()),
        },
        Event::PreviewShown { index, id } => {
            format!("Previewing position {} (page {id})", index + 1)
        }
        Event::PreviewUnchanged => "Preview unchanged".to_string(),
        Event::PreviewClosed => "Preview closed".to_string(),
        Event::Cleared { pages, sources } => {
            format!("Cleared {pages} page(s), released {sources} source(s)")
        }
    }
}

/// Display export statistics. Details only show in verbose mode.
pub fn display_export_statistics(formatter: &OutputFormatter, stats: &ExportStatistics) {
    formatter.detail("Pages", &stats.pages.to_string());
    formatter.detail("Sources opened", &stats.sources_opened.len().to_string());
    formatter.detail("Output size", &stats.format_output_size());
    formatter.detail(
        "Export time",
        &format!("{:.2}s", stats.elapsed.as_secs_f64()),
    );
    formatter.detail(
        "Compression",
        match stats.compression {
            crate::config::CompressionLevel::None => "none",
            crate::config::CompressionLevel::Standard => "standard",
            crate::config::CompressionLevel::Maximum => "maximum",
        },
    );
}

/// Everything a run did, for `--json`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Inputs the reader skipped, with reasons.
    pub skipped: Vec<String>,
    /// Import outcome.
    pub import: ImportReport,
    /// Edits applied, in order, as given.
    pub edits: Vec<String>,
    /// Final page plan.
    pub pages: Vec<PlanEntry>,
    /// Sources the final plan draws from, in first-use order.
    pub sources: Vec<String>,
    /// Export statistics, if an export ran.
    pub export: Option<ExportStatistics>,
    /// Where the output was written.
    pub output: Option<PathBuf>,
    /// Thumbnails written to disk.
    pub thumbnails_written: usize,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RunSummary {
    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceStore;
    use crate::utils::pdf::fixtures::pdf_with_pages;

    fn collection() -> PageCollection {
        let mut store = SourceStore::new();
        let mut pages = PageCollection::new();
        pages.append_with_rotations(
            store.register("a.pdf", pdf_with_pages(2, 100, &[])),
            &[Rotation::None, Rotation::Clockwise90],
        );
        pages
    }

    #[test]
    fn test_page_plan_follows_collection_order() {
        let mut pages = collection();
        pages.move_page(1, 0).unwrap();

        let plan = page_plan(&pages);

        assert_eq!(plan.len(), 2);
        assert_eq!((plan[0].position, plan[0].page), (1, 2));
        assert_eq!(plan[0].rotation, Rotation::Clockwise90);
        assert_eq!((plan[1].position, plan[1].page), (2, 1));
        assert_eq!(plan[1].thumbnail, "pending");
    }

    #[test]
    fn test_plan_sources_in_first_use_order() {
        let mut store = SourceStore::new();
        let mut pages = PageCollection::new();
        pages.append(store.register("a.pdf", pdf_with_pages(1, 100, &[])), 1);
        pages.append(store.register("b.pdf", pdf_with_pages(2, 500, &[])), 2);
        pages.move_page(2, 0).unwrap();
        pages.append(store.register("again.pdf", pdf_with_pages(1, 100, &[])), 1);

        assert_eq!(plan_sources(&pages), ["b.pdf", "a.pdf"]);
    }

    #[test]
    fn test_plan_entry_line() {
        let plan = page_plan(&collection());
        assert_eq!(plan[0].line(), "a.pdf p1/2");
        assert!(plan[1].line().starts_with("a.pdf p2/2  ↻"));
    }

    #[test]
    fn test_describe_event_is_one_based() {
        let pages = collection();
        let id = pages.at(0).unwrap().id();

        assert_eq!(
            describe_event(&Event::Moved { id, from: 0, to: 1 }),
            format!("Moved page {id} from position 1 to 2")
        );
        assert_eq!(
            describe_event(&Event::Cleared {
                pages: 3,
                sources: 1
            }),
            "Cleared 3 page(s), released 1 source(s)"
        );
    }

    #[test]
    fn test_run_summary_json() {
        let summary = RunSummary {
            pages: page_plan(&collection()),
            dry_run: true,
            ..Default::default()
        };

        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["pages"][1]["rotation"], 90);
        assert_eq!(json["pages"][0]["file"], "a.pdf");
        assert!(json["export"].is_null());
    }
}
