//! Shared fixtures for the integration tests.
//!
//! Fixtures are generated in memory. Page `i` of a fixture has MediaBox
//! width `base_width + i`, so the order of pages in an exported document can
//! be read back from the widths alone.

#![allow(dead_code)]

use lopdf::{Document, Object, dictionary};
use std::path::PathBuf;
use tempfile::TempDir;

use pagemerge::config::WorkspaceOptions;
use pagemerge::utils::pdf;
use pagemerge::workspace::{ImportFile, Workspace};

/// Build a PDF with `pages` pages. `rotations[i]`, if present, becomes the
/// `/Rotate` of page `i`.
pub fn pdf_with_pages(pages: usize, base_width: i64, rotations: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for i in 0..pages {
        let content_id = doc.add_object(lopdf::Stream::new(
            dictionary! {},
            format!("BT /F1 24 Tf 72 700 Td (Page {}) Tj ET", i + 1).into_bytes(),
        ));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (base_width + i as i64).into(), 800.into()],
            "Contents" => content_id,
        };
        if let Some(rotate) = rotations.get(i) {
            page.set("Rotate", *rotate);
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// An import file built from [`pdf_with_pages`].
pub fn import_file(name: &str, pages: usize, base_width: i64) -> ImportFile {
    ImportFile::new(name, pdf_with_pages(pages, base_width, &[]))
}

/// A workspace with default options and the given files imported.
pub async fn workspace_with(files: Vec<ImportFile>) -> Workspace {
    let mut workspace = Workspace::new(WorkspaceOptions::default()).unwrap();
    let report = workspace.import(files).await;
    assert!(report.is_complete(), "fixture import failed: {report:?}");
    workspace
}

/// MediaBox widths of the pages of `bytes`, in page order.
pub fn page_widths(bytes: &[u8]) -> Vec<i64> {
    let doc = pdf::load_document(bytes).unwrap();
    pdf::page_ids(&doc)
        .into_iter()
        .map(|page| pdf::media_box(&doc, page)[2] as i64)
        .collect()
}

/// `/Rotate` of the pages of `bytes`, in page order.
pub fn page_rotations(bytes: &[u8]) -> Vec<u16> {
    let doc = pdf::load_document(bytes).unwrap();
    pdf::page_ids(&doc)
        .into_iter()
        .map(|page| pdf::declared_rotation(&doc, page).as_degrees())
        .collect()
}

/// Write `bytes` to `name` inside `dir`.
pub fn write_fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
