//! Integration tests for importing sources and exporting the page sequence.

use pagemerge::config::{CompressionLevel, ExportOptions, Metadata, WorkspaceOptions};
use pagemerge::export::metadata::read_info;
use pagemerge::utils::pdf;
use pagemerge::workspace::{Command, ImportFile, Workspace};

use crate::common::{import_file, page_rotations, page_widths, pdf_with_pages, workspace_with};

#[tokio::test]
async fn test_export_without_edits_keeps_source_order() {
    let workspace = workspace_with(vec![import_file("a.pdf", 3, 100)]).await;

    let output = workspace.export().await.unwrap();

    assert_eq!(page_widths(&output.bytes), [100, 101, 102]);
    assert_eq!(output.statistics.pages, 3);
    assert_eq!(output.statistics.sources_opened.len(), 1);
    assert_eq!(output.statistics.output_size, output.bytes.len() as u64);
}

#[tokio::test]
async fn test_pages_grouped_by_file_in_input_order() {
    let workspace = workspace_with(vec![
        import_file("b.pdf", 2, 500),
        import_file("a.pdf", 2, 100),
    ])
    .await;

    let output = workspace.export().await.unwrap();
    assert_eq!(page_widths(&output.bytes), [500, 501, 100, 101]);
}

#[tokio::test]
async fn test_interleaved_pages_open_each_source_once() {
    let mut workspace = workspace_with(vec![
        import_file("a.pdf", 2, 100),
        import_file("b.pdf", 1, 500),
    ])
    .await;
    let a = workspace.collection().at(0).unwrap().source().id().clone();
    let b = workspace.collection().at(2).unwrap().source().id().clone();

    // [A1, A2, B1] -> [A2, B1, A1]
    workspace
        .apply(Command::Move { from: 0, to: 2 })
        .await
        .unwrap();

    let output = workspace.export().await.unwrap();
    assert_eq!(page_widths(&output.bytes), [101, 500, 100]);
    assert_eq!(output.statistics.sources_opened, vec![a, b]);
}

#[tokio::test]
async fn test_same_bytes_twice_share_one_source() {
    let bytes = pdf_with_pages(2, 100, &[]);
    let workspace = workspace_with(vec![
        ImportFile::new("first.pdf", bytes.clone()),
        ImportFile::new("copy.pdf", bytes),
    ])
    .await;

    assert_eq!(workspace.store().len(), 1);
    assert_eq!(workspace.collection().len(), 4);
    // The first name is kept for display.
    assert_eq!(workspace.collection().at(3).unwrap().source().name(), "first.pdf");

    let output = workspace.export().await.unwrap();
    assert_eq!(page_widths(&output.bytes), [100, 101, 100, 101]);
    assert_eq!(output.statistics.sources_opened.len(), 1);
}

#[tokio::test]
async fn test_declared_rotation_is_replaced_not_compounded() {
    let mut workspace = workspace_with(vec![ImportFile::new(
        "scan.pdf",
        pdf_with_pages(2, 100, &[90, 0]),
    )])
    .await;
    let first = workspace.collection().at(0).unwrap().id();

    let output = workspace.export().await.unwrap();
    assert_eq!(page_rotations(&output.bytes), [90, 0]);

    workspace
        .apply(Command::Rotate {
            id: first,
            degrees: 90,
        })
        .await
        .unwrap();

    let output = workspace.export().await.unwrap();
    assert_eq!(page_rotations(&output.bytes), [180, 0]);
}

#[tokio::test]
async fn test_rotate_all_sets_rotate_on_every_page() {
    let mut workspace = workspace_with(vec![import_file("a.pdf", 3, 100)]).await;

    workspace
        .apply(Command::RotateAll { degrees: -90 })
        .await
        .unwrap();

    let output = workspace.export().await.unwrap();
    assert_eq!(page_rotations(&output.bytes), [270, 270, 270]);
}

#[tokio::test]
async fn test_exported_page_keeps_inherited_resources() {
    let workspace = workspace_with(vec![import_file("a.pdf", 1, 100)]).await;

    let output = workspace.export().await.unwrap();
    let doc = pdf::load_document(&output.bytes).unwrap();
    let page = pdf::page_ids(&doc)[0];

    let resources = pdf::inherited_attribute(&doc, page, b"Resources").unwrap();
    let fonts = resources.as_dict().unwrap().get(b"Font").unwrap();
    assert!(pdf::resolve(&doc, fonts).unwrap().as_dict().is_ok());
}

#[tokio::test]
async fn test_export_writes_metadata_and_honours_compression() {
    let options = WorkspaceOptions {
        export: ExportOptions {
            compression: CompressionLevel::None,
            metadata: Metadata::new(Some("Bundle".into()), Some("Ops".into()), None, None),
        },
        ..Default::default()
    };
    let mut workspace = Workspace::new(options).unwrap();
    workspace.import(vec![import_file("a.pdf", 1, 100)]).await;

    let output = workspace.export().await.unwrap();

    let doc = pdf::load_document(&output.bytes).unwrap();
    let info = read_info(&doc);
    assert_eq!(info.title.as_deref(), Some("Bundle"));
    assert_eq!(info.author.as_deref(), Some("Ops"));
    assert_eq!(output.statistics.compression, CompressionLevel::None);
}

#[tokio::test]
async fn test_export_does_not_change_the_collection() {
    let workspace = workspace_with(vec![import_file("a.pdf", 2, 100)]).await;
    let before = workspace.collection().ids();

    workspace.export().await.unwrap();
    workspace.export().await.unwrap();

    assert_eq!(workspace.collection().ids(), before);
}
