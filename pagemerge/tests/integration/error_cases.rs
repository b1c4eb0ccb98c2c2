//! Integration tests for error handling and edge cases.

use std::sync::Arc;

use pagemerge::config::{ExportOptions, WorkspaceOptions};
use pagemerge::error::PageMergeError;
use pagemerge::export::{ExportPipeline, assemble};
use pagemerge::pages::{PageCollection, Rotation};
use pagemerge::source::SourceStore;
use pagemerge::workspace::{Command, ImportFile, Workspace};

use crate::common::{import_file, page_widths, pdf_with_pages, workspace_with};

#[tokio::test]
async fn test_corrupt_file_does_not_stop_the_batch() {
    let mut workspace = Workspace::new(WorkspaceOptions::default()).unwrap();

    let report = workspace
        .import(vec![
            import_file("a.pdf", 1, 100),
            ImportFile::new("broken.pdf", b"%PDF-1.4 this is not a pdf".to_vec()),
            ImportFile::new("empty.pdf", Vec::new()),
            import_file("c.pdf", 2, 300),
        ])
        .await;

    assert_eq!(report.imported.len(), 2);
    let failed: Vec<_> = report.failed.iter().map(|f| f.file.as_str()).collect();
    assert_eq!(failed, ["broken.pdf", "empty.pdf"]);
    assert_eq!(report.failed[1].reason, "the file is empty");

    let output = workspace.export().await.unwrap();
    assert_eq!(page_widths(&output.bytes), [100, 300, 301]);
}

#[tokio::test]
async fn test_export_of_empty_workspace() {
    let workspace = Workspace::new(WorkspaceOptions::default()).unwrap();

    let err = workspace.export().await.unwrap_err();
    assert!(matches!(err, PageMergeError::EmptyCollection));
}

#[tokio::test]
async fn test_out_of_range_page_aborts_export() {
    let mut store = SourceStore::new();
    let mut collection = PageCollection::new();
    let source = store.register("short.pdf", pdf_with_pages(2, 100, &[]));
    collection.append(Arc::clone(&source), 2);
    collection.append_page(source, 5, 2, Rotation::None);

    let err = ExportPipeline::default()
        .export(&collection)
        .await
        .unwrap_err();

    match err {
        PageMergeError::PageOutOfRange {
            file,
            page,
            page_count,
        } => {
            assert_eq!(file, "short.pdf");
            assert_eq!(page, 6);
            assert_eq!(page_count, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unparseable_source_at_export() {
    let mut store = SourceStore::new();
    let mut collection = PageCollection::new();
    collection.append(store.register("junk.pdf", b"not a pdf".to_vec()), 1);

    let items = ExportPipeline::snapshot(&collection);
    let err = assemble(&items, &ExportOptions::default()).unwrap_err();

    assert!(matches!(err, PageMergeError::InvalidSourceData { ref file, .. } if file == "junk.pdf"));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_invalid_rotation_changes_nothing() {
    let mut workspace = workspace_with(vec![import_file("a.pdf", 2, 100)]).await;

    let err = workspace
        .apply(Command::RotateAll { degrees: 45 })
        .await
        .unwrap_err();

    assert!(matches!(err, PageMergeError::InvalidRotation { degrees: 45 }));
    assert!(
        workspace
            .collection()
            .iter()
            .all(|record| record.rotation() == Rotation::None)
    );
}

#[tokio::test]
async fn test_move_out_of_range_is_not_clamped() {
    let mut workspace = workspace_with(vec![import_file("a.pdf", 2, 100)]).await;
    let ids = workspace.collection().ids();

    let err = workspace
        .apply(Command::Move { from: 0, to: 2 })
        .await
        .unwrap_err();

    assert!(matches!(err, PageMergeError::IndexOutOfRange { index: 2, len: 2 }));
    assert_eq!(workspace.collection().ids(), ids);
}

#[tokio::test]
async fn test_edit_position_out_of_range() {
    let mut workspace = workspace_with(vec![import_file("a.pdf", 2, 100)]).await;

    let err = workspace
        .apply_edit(&"rotate 3 90".parse().unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, PageMergeError::InvalidEdit { .. }));
    assert_eq!(err.exit_code(), 1);
}
