//! Page records: one page of one source document.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::Rotation;
use crate::source::SourceDocument;

/// Stable identity of a page record.
///
/// Ids are handed out by a [`PageCollection`](super::PageCollection) from a
/// monotonic counter and are never reused, so they stay valid keys while the
/// order of records changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(u64);

impl PageId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cached rendering of a page.
#[derive(Debug, Clone, Default)]
pub enum ThumbnailState {
    /// Not rendered yet, or invalidated by a rotation.
    #[default]
    Pending,
    /// Rendered bitmap.
    Ready {
        /// The bitmap.
        image: Arc<RgbaImage>,
        /// Rotation the bitmap was rendered with.
        rotation: Rotation,
    },
    /// The renderer rejected the page.
    Failed {
        /// Why rendering failed.
        reason: String,
    },
}

impl ThumbnailState {
    /// Whether a bitmap is available.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// The bitmap, if available.
    pub fn image(&self) -> Option<&RgbaImage> {
        match self {
            Self::Ready { image, .. } => Some(image),
            _ => None,
        }
    }
}

/// One page in the collection.
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub(super) id: PageId,
    pub(super) source: Arc<SourceDocument>,
    pub(super) source_page_index: usize,
    pub(super) source_page_count: usize,
    pub(super) rotation: Rotation,
    pub(super) thumbnail: ThumbnailState,
}

impl PageRecord {
    /// Stable id.
    pub fn id(&self) -> PageId {
        self.id
    }

    /// The source document this page is drawn from.
    pub fn source(&self) -> &Arc<SourceDocument> {
        &self.source
    }

    /// Zero-based page index within the source.
    pub fn source_page_index(&self) -> usize {
        self.source_page_index
    }

    /// 1-based page number within the source, for display.
    pub fn source_page_number(&self) -> usize {
        self.source_page_index + 1
    }

    /// Number of pages the source had at import time.
    pub fn source_page_count(&self) -> usize {
        self.source_page_count
    }

    /// Current absolute rotation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Cached rendering.
    pub fn thumbnail(&self) -> &ThumbnailState {
        &self.thumbnail
    }

    /// Short label such as `"report.pdf p2/7"`.
    pub fn label(&self) -> String {
        format!(
            "{} p{}/{}",
            self.source.name(),
            self.source_page_number(),
            self.source_page_count
        )
    }
}
