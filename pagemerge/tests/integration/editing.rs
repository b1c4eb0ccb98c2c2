//! Integration tests for editing the collection and driving the preview.

use pagemerge::config::EditCommand;
use pagemerge::pages::{Rotation, ThumbnailState};
use pagemerge::workspace::{Command, Event};

use crate::common::{import_file, page_rotations, page_widths, workspace_with};

fn edit(s: &str) -> EditCommand {
    EditCommand::parse(s).unwrap()
}

#[tokio::test]
async fn test_edit_script_end_to_end() {
    let mut workspace = workspace_with(vec![
        import_file("a.pdf", 3, 100),
        import_file("b.pdf", 2, 500),
    ])
    .await;

    // [a1 a2 a3 b1 b2]
    for script in ["remove 2", "move 4 1", "rotate 2 90", "rotate-all 180"] {
        workspace.apply_edit(&edit(script)).await.unwrap();
    }

    // remove 2  -> [a1 a3 b1 b2]
    // move 4 1  -> [b2 a1 a3 b1]
    let output = workspace.export().await.unwrap();
    assert_eq!(page_widths(&output.bytes), [501, 100, 102, 500]);
    assert_eq!(page_rotations(&output.bytes), [180, 270, 180, 180]);
}

#[tokio::test]
async fn test_ids_survive_reordering() {
    let mut workspace = workspace_with(vec![import_file("a.pdf", 4, 100)]).await;
    let ids = workspace.collection().ids();

    workspace
        .apply(Command::Move { from: 0, to: 3 })
        .await
        .unwrap();
    workspace
        .apply(Command::Move { from: 3, to: 0 })
        .await
        .unwrap();

    assert_eq!(workspace.collection().ids(), ids);
}

#[tokio::test]
async fn test_full_turn_restores_rotation() {
    let mut workspace = workspace_with(vec![import_file("a.pdf", 1, 100)]).await;
    let id = workspace.collection().at(0).unwrap().id();

    for degrees in [90, 270] {
        workspace
            .apply(Command::Rotate { id, degrees })
            .await
            .unwrap();
    }

    let record = workspace.collection().get(id).unwrap();
    assert_eq!(record.rotation(), Rotation::None);
    assert!(matches!(
        record.thumbnail(),
        ThumbnailState::Ready {
            rotation: Rotation::None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_thumbnails_follow_rotation() {
    let mut workspace = workspace_with(vec![import_file("a.pdf", 1, 200)]).await;
    let id = workspace.collection().at(0).unwrap().id();

    let before = workspace.collection().get(id).unwrap().thumbnail().clone();
    assert_eq!(before.image().unwrap().dimensions(), (100, 400));

    workspace
        .apply(Command::Rotate { id, degrees: 90 })
        .await
        .unwrap();

    let after = workspace.collection().get(id).unwrap().thumbnail();
    assert_eq!(after.image().unwrap().dimensions(), (400, 100));
}

#[tokio::test]
async fn test_preview_navigation() {
    let mut workspace = workspace_with(vec![import_file("a.pdf", 3, 100)]).await;

    let event = workspace.apply_edit(&edit("preview 3")).await.unwrap();
    assert!(matches!(event, Event::PreviewShown { index: 2, .. }));

    // No wraparound at the end.
    let event = workspace.apply(Command::PreviewNext).await.unwrap();
    assert_eq!(event, Event::PreviewUnchanged);

    workspace.apply(Command::PreviewPrevious).await.unwrap();
    assert_eq!(
        workspace
            .preview()
            .position_label(workspace.collection())
            .unwrap(),
        "2 / 3"
    );

    workspace
        .apply(Command::PreviewRotate { degrees: 90 })
        .await
        .unwrap();
    assert_eq!(
        workspace.collection().at(1).unwrap().rotation(),
        Rotation::Clockwise90
    );
    assert_eq!(
        workspace.preview().preview().unwrap().rotation,
        Rotation::Clockwise90
    );
}

#[tokio::test]
async fn test_preview_closes_when_its_page_disappears() {
    let mut workspace = workspace_with(vec![import_file("a.pdf", 2, 100)]).await;

    workspace.apply_edit(&edit("preview 2")).await.unwrap();
    workspace.apply_edit(&edit("remove 2")).await.unwrap();

    assert!(!workspace.preview().is_open());
}

#[tokio::test]
async fn test_clear_then_import_again() {
    let mut workspace = workspace_with(vec![import_file("a.pdf", 2, 100)]).await;
    let old_ids = workspace.collection().ids();

    let event = workspace.apply(Command::Clear).await.unwrap();
    assert_eq!(
        event,
        Event::Cleared {
            pages: 2,
            sources: 1
        }
    );
    assert!(workspace.store().is_empty());

    let report = workspace.import(vec![import_file("a.pdf", 2, 100)]).await;
    // Ids are never reused.
    assert!(report.page_ids().iter().all(|id| !old_ids.contains(id)));
}
