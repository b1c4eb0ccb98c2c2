//! The ordered, mutable collection of pages.
//!
//! A [`PageCollection`] is the model everything else works against: its order
//! is exactly the order pages will have in the exported document. Records
//! are addressed by [`PageId`] for identity and by position for ordering;
//! positions shift as records move, ids never do.
//!
//! # Examples
//!
//! ```
//! use pagemerge::pages::{PageCollection, Rotation};
//! use pagemerge::source::SourceStore;
//!
//! let mut store = SourceStore::new();
//! let source = store.register("a.pdf", b"%PDF-1.7".to_vec());
//!
//! let mut pages = PageCollection::new();
//! let ids = pages.append(source, 3);
//! pages.move_page(2, 0).unwrap();
//! pages.rotate(ids[0], -90).unwrap();
//!
//! assert_eq!(pages.ids(), vec![ids[2], ids[0], ids[1]]);
//! assert_eq!(pages.get(ids[0]).unwrap().rotation(), Rotation::Clockwise270);
//! ```

mod record;
mod rotation;

pub use record::{PageId, PageRecord, ThumbnailState};
pub use rotation::Rotation;

use std::sync::Arc;

use crate::error::{PageMergeError, Result};
use crate::source::{SourceDocument, SourceId};

/// Ordered list of page records.
#[derive(Debug, Default)]
pub struct PageCollection {
    records: Vec<PageRecord>,
    next_id: u64,
}

impl PageCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> PageId {
        self.next_id += 1;
        PageId::new(self.next_id)
    }

    /// Append every page of a source, upright, in source order.
    ///
    /// Returns the ids of the new records in the order they were appended.
    pub fn append(&mut self, source: Arc<SourceDocument>, page_count: usize) -> Vec<PageId> {
        self.append_with_rotations(source, &vec![Rotation::None; page_count])
    }

    /// Append every page of a source, each starting at the given rotation.
    ///
    /// `rotations[i]` belongs to source page `i`; the source is assumed to
    /// have `rotations.len()` pages.
    pub fn append_with_rotations(
        &mut self,
        source: Arc<SourceDocument>,
        rotations: &[Rotation],
    ) -> Vec<PageId> {
        let page_count = rotations.len();
        self.records.reserve(page_count);

        let ids = rotations
            .iter()
            .enumerate()
            .map(|(index, &rotation)| {
                self.append_page(Arc::clone(&source), index, page_count, rotation)
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            source = %source.id(),
            name = source.name(),
            pages = page_count,
            total = self.records.len(),
            "appended source pages"
        );
        ids
    }

    /// Append a single page record.
    ///
    /// The index is not checked against the real document here; export
    /// validates every reference before copying.
    pub fn append_page(
        &mut self,
        source: Arc<SourceDocument>,
        source_page_index: usize,
        source_page_count: usize,
        rotation: Rotation,
    ) -> PageId {
        let id = self.allocate_id();
        self.records.push(PageRecord {
            id,
            source,
            source_page_index,
            source_page_count,
            rotation,
            thumbnail: ThumbnailState::Pending,
        });
        id
    }

    /// Remove the record with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::PageNotFound`] if no such record exists.
    pub fn remove(&mut self, id: PageId) -> Result<PageRecord> {
        let position = self
            .position(id)
            .ok_or(PageMergeError::PageNotFound { id })?;
        Ok(self.records.remove(position))
    }

    /// Move the record at `old_index` so that it ends up at `new_index`.
    ///
    /// `new_index` addresses the sequence after the record has been taken
    /// out, which for a list of unchanged length means the record simply
    /// lands at `new_index`.
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::IndexOutOfRange`] if either index is not a
    /// valid position. Indices are never clamped.
    pub fn move_page(&mut self, old_index: usize, new_index: usize) -> Result<()> {
        let len = self.records.len();
        for index in [old_index, new_index] {
            if index >= len {
                return Err(PageMergeError::IndexOutOfRange { index, len });
            }
        }

        let record = self.records.remove(old_index);
        self.records.insert(new_index, record);
        Ok(())
    }

    /// Rotate a record by `delta_degrees`, normalizing into `[0, 360)`.
    ///
    /// The record's thumbnail is invalidated; no other record is touched.
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::PageNotFound`] for an unknown id and
    /// [`PageMergeError::InvalidRotation`] if the delta is not a multiple of
    /// 90. The record is unchanged in both cases.
    pub fn rotate(&mut self, id: PageId, delta_degrees: i64) -> Result<Rotation> {
        let record = self.get_mut(id).ok_or(PageMergeError::PageNotFound { id })?;
        let rotation = record.rotation.rotated_by(delta_degrees)?;

        record.rotation = rotation;
        record.thumbnail = ThumbnailState::Pending;
        Ok(rotation)
    }

    /// Remove every record. Returns how many were removed.
    ///
    /// Ids keep counting up afterwards.
    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        removed
    }

    /// Store a render result for a record.
    ///
    /// The result is only kept if the record still exists and still has the
    /// rotation the bitmap was rendered with; otherwise it is stale and
    /// `false` is returned.
    pub fn set_thumbnail(
        &mut self,
        id: PageId,
        rendered_rotation: Rotation,
        thumbnail: ThumbnailState,
    ) -> bool {
        match self.get_mut(id) {
            Some(record) if record.rotation == rendered_rotation => {
                record.thumbnail = thumbnail;
                true
            }
            _ => false,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record by id.
    pub fn get(&self, id: PageId) -> Option<&PageRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Mutable record by id.
    pub(crate) fn get_mut(&mut self, id: PageId) -> Option<&mut PageRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// Current position of a record.
    pub fn position(&self, id: PageId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Record at a position.
    pub fn at(&self, index: usize) -> Option<&PageRecord> {
        self.records.get(index)
    }

    /// Records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, PageRecord> {
        self.records.iter()
    }

    /// Ids in order.
    pub fn ids(&self) -> Vec<PageId> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// Distinct sources referenced by the collection, in first-use order.
    pub fn distinct_sources(&self) -> Vec<Arc<SourceDocument>> {
        let mut seen: Vec<&SourceId> = Vec::new();
        let mut sources = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.source.id()) {
                seen.push(record.source.id());
                sources.push(Arc::clone(&record.source));
            }
        }
        sources
    }
}

impl<'a> IntoIterator for &'a PageCollection {
    type Item = &'a PageRecord;
    type IntoIter = std::slice::Iter<'a, PageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
