//! Typed mutations of a workspace and their outcomes.

use crate::config::EditCommand;
use crate::error::{PageMergeError, Result};
use crate::pages::{PageCollection, PageId, Rotation};

/// A mutation applied through [`Workspace::apply`](super::Workspace::apply).
///
/// Pages are addressed by id where identity matters and by zero-based
/// position where order does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Remove the given pages.
    Remove(Vec<PageId>),
    /// Move the page at `from` so that it ends up at `to`.
    Move {
        /// Current position.
        from: usize,
        /// Target position.
        to: usize,
    },
    /// Rotate one page by a multiple of 90 degrees.
    Rotate {
        /// Page to rotate.
        id: PageId,
        /// Clockwise delta.
        degrees: i64,
    },
    /// Rotate every page by the same delta.
    RotateAll {
        /// Clockwise delta.
        degrees: i64,
    },
    /// Open the preview on a position.
    Preview {
        /// Position to show.
        index: usize,
    },
    /// Show the next page in the preview.
    PreviewNext,
    /// Show the previous page in the preview.
    PreviewPrevious,
    /// Rotate the previewed page.
    PreviewRotate {
        /// Clockwise delta.
        degrees: i64,
    },
    /// Close the preview.
    ClosePreview,
    /// Remove every page.
    Clear,
}

/// What a [`Command`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Pages were removed.
    Removed {
        /// Removed ids.
        ids: Vec<PageId>,
    },
    /// A page moved.
    Moved {
        /// The page that moved.
        id: PageId,
        /// Old position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// Pages were rotated; each entry has the new absolute rotation.
    Rotated {
        /// Rotated pages.
        pages: Vec<(PageId, Rotation)>,
    },
    /// The preview now shows a page.
    PreviewShown {
        /// Position shown.
        index: usize,
        /// Page shown.
        id: PageId,
    },
    /// Navigation was not possible; the preview did not change.
    PreviewUnchanged,
    /// The preview was closed.
    PreviewClosed,
    /// The collection was emptied.
    Cleared {
        /// Pages removed.
        pages: usize,
        /// Sources released from the store.
        sources: usize,
    },
}

impl Command {
    /// Translate a 1-based edit into a command against `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::InvalidEdit`] if a position does not exist.
    pub fn from_edit(edit: &EditCommand, collection: &PageCollection) -> Result<Self> {
        let len = collection.len();
        let index_of = |position: usize| {
            if (1..=len).contains(&position) {
                Ok(position - 1)
            } else {
                Err(PageMergeError::invalid_edit(
                    edit.to_string(),
                    format!("position {position} is out of range for {len} page(s)"),
                ))
            }
        };
        let id_at = |position: usize| -> Result<PageId> {
            let index = index_of(position)?;
            collection
                .at(index)
                .map(|record| record.id())
                .ok_or(PageMergeError::IndexOutOfRange { index, len })
        };

        let command = match edit {
            EditCommand::Move { from, to } => Self::Move {
                from: index_of(*from)?,
                to: index_of(*to)?,
            },
            EditCommand::Rotate { position, degrees } => Self::Rotate {
                id: id_at(*position)?,
                degrees: *degrees,
            },
            EditCommand::RotateAll { degrees } => Self::RotateAll { degrees: *degrees },
            EditCommand::Remove(list) => {
                let indices = list
                    .to_indices(len)
                    .map_err(|e| PageMergeError::invalid_edit(edit.to_string(), e.to_string()))?;
                Self::Remove(
                    indices
                        .into_iter()
                        .filter_map(|index| collection.at(index).map(|r| r.id()))
                        .collect(),
                )
            }
            EditCommand::Preview { position } => Self::Preview {
                index: index_of(*position)?,
            },
            EditCommand::Next => Self::PreviewNext,
            EditCommand::Previous => Self::PreviewPrevious,
            EditCommand::PreviewRotate { degrees } => Self::PreviewRotate { degrees: *degrees },
            EditCommand::ClosePreview => Self::ClosePreview,
            EditCommand::Clear => Self::Clear,
        };

        Ok(command)
    }
}
