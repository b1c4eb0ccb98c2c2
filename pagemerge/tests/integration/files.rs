//! Integration tests for the disk round trip: read inputs, export, write.

use pagemerge::config::WorkspaceOptions;
use pagemerge::error::PageMergeError;
use pagemerge::io::{OutputWriter, SourceReader};
use pagemerge::workspace::Workspace;
use tempfile::TempDir;

use crate::common::{page_widths, pdf_with_pages, write_fixture};

#[tokio::test]
async fn test_read_import_export_write() {
    let dir = TempDir::new().unwrap();
    let a = write_fixture(&dir, "a.pdf", &pdf_with_pages(2, 100, &[]));
    let notes = write_fixture(&dir, "notes.txt", b"shopping list");
    let b = write_fixture(&dir, "b.pdf", &pdf_with_pages(1, 500, &[]));

    let loaded = SourceReader::new().load_all(&[a, notes, b]).await;
    assert_eq!(loaded.skipped.len(), 1);
    assert!(matches!(
        loaded.skipped[0].error,
        PageMergeError::UnsupportedMediaType { .. }
    ));

    let mut workspace = Workspace::new(WorkspaceOptions::default()).unwrap();
    let report = workspace.import(loaded.files).await;
    assert_eq!(report.pages_added(), 3);

    let output_path = dir.path().join("merged.pdf");
    let output = workspace.export().await.unwrap();
    let stats = OutputWriter::new()
        .save(output.bytes, &output_path)
        .await
        .unwrap();

    let written = std::fs::read(&output_path).unwrap();
    assert_eq!(stats.file_size, written.len() as u64);
    assert_eq!(page_widths(&written), [100, 101, 500]);
}

#[tokio::test]
async fn test_pdf_with_wrong_extension_is_sniffed() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "download.bin", &pdf_with_pages(1, 100, &[]));

    let loaded = SourceReader::new().load_all(&[path]).await;

    assert_eq!(loaded.files.len(), 1);
    assert!(loaded.skipped.is_empty());
}
