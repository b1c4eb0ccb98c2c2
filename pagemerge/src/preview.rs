//! Enlarged single-page preview with previous/next navigation.

use std::sync::Arc;

use crate::error::{PageMergeError, Result};
use crate::pages::{PageCollection, PageId, Rotation, ThumbnailState};
use crate::render::{PageRenderer, RenderRequest, render_thumbnail};

/// The page currently shown in the preview.
#[derive(Debug, Clone)]
pub struct Preview {
    /// Position of the page in the collection.
    pub index: usize,
    /// Record being shown.
    pub page_id: PageId,
    /// Rotation the image was rendered with.
    pub rotation: Rotation,
    /// Rendered image, or why it could not be rendered.
    pub image: ThumbnailState,
}

/// Tracks which page is previewed and renders it at preview scale.
pub struct PreviewController {
    renderer: Arc<dyn PageRenderer>,
    scale: f32,
    preview: Option<Preview>,
}

impl PreviewController {
    /// Create a closed preview that renders at `scale`.
    pub fn new(renderer: Arc<dyn PageRenderer>, scale: f32) -> Self {
        Self {
            renderer,
            scale,
            preview: None,
        }
    }

    /// Position being previewed, if the preview is open.
    pub fn current(&self) -> Option<usize> {
        self.preview.as_ref().map(|p| p.index)
    }

    /// The open preview.
    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    /// Whether the preview is open.
    pub fn is_open(&self) -> bool {
        self.preview.is_some()
    }

    /// Open the preview on the page at `index`.
    ///
    /// A render failure does not close the preview; the failure is kept in
    /// [`Preview::image`].
    ///
    /// # Errors
    ///
    /// Returns [`PageMergeError::IndexOutOfRange`] if `index` is not a valid
    /// position. The previous preview state is kept in that case.
    pub async fn show(&mut self, collection: &PageCollection, index: usize) -> Result<&Preview> {
        let record = collection.at(index).ok_or(PageMergeError::IndexOutOfRange {
            index,
            len: collection.len(),
        })?;

        let request = RenderRequest::for_record(record, self.scale);
        let page_id = record.id();
        let rotation = record.rotation();
        let image = render_thumbnail(Arc::clone(&self.renderer), request).await;

        tracing::debug!(page = %page_id, index, "preview shown");
        Ok(&*self.preview.insert(Preview {
            index,
            page_id,
            rotation,
            image,
        }))
    }

    /// Whether there is a page before the current one.
    pub fn has_previous(&self) -> bool {
        matches!(self.current(), Some(index) if index > 0)
    }

    /// Whether there is a page after the current one.
    pub fn has_next(&self, collection: &PageCollection) -> bool {
        matches!(self.current(), Some(index) if index + 1 < collection.len())
    }

    /// "3 / 10" style position, 1-based.
    pub fn position_label(&self, collection: &PageCollection) -> Option<String> {
        self.current()
            .map(|index| format!("{} / {}", index + 1, collection.len()))
    }

    /// Move the preview by `delta` positions.
    ///
    /// Returns `Ok(None)` without changing anything if the preview is closed
    /// or the target lies outside the collection. Navigation never wraps.
    pub async fn advance(
        &mut self,
        collection: &PageCollection,
        delta: isize,
    ) -> Result<Option<&Preview>> {
        let Some(current) = self.current() else {
            return Ok(None);
        };
        let Some(target) = current
            .checked_add_signed(delta)
            .filter(|&target| target < collection.len())
        else {
            return Ok(None);
        };

        self.show(collection, target).await.map(Some)
    }

    /// Rotate the previewed page and render it again.
    ///
    /// # Errors
    ///
    /// Fails if the preview is closed or the rotation is rejected by the
    /// collection.
    pub async fn rotate_current(
        &mut self,
        collection: &mut PageCollection,
        delta_degrees: i64,
    ) -> Result<Rotation> {
        let Some(preview) = &self.preview else {
            return Err(PageMergeError::other("No page is being previewed"));
        };
        let (page_id, index) = (preview.page_id, preview.index);

        let rotation = collection.rotate(page_id, delta_degrees)?;
        self.show(collection, index).await?;
        Ok(rotation)
    }

    /// Render the current page again, e.g. after the collection changed.
    pub async fn refresh(&mut self, collection: &PageCollection) -> Result<Option<&Preview>> {
        match self.current() {
            Some(index) => self.show(collection, index).await.map(Some),
            None => Ok(None),
        }
    }

    /// Close the preview.
    pub fn close(&mut self) {
        self.preview = None;
    }

    /// Reconcile with the collection after a structural change.
    ///
    /// Closes the preview if its position no longer exists. Returns `true`
    /// if the preview is still open but its position now holds a different
    /// page or rotation, i.e. it should be refreshed.
    pub fn sync(&mut self, collection: &PageCollection) -> bool {
        let Some(Preview {
            index,
            page_id,
            rotation,
            ..
        }) = self.preview
        else {
            return false;
        };

        match collection.at(index) {
            None => {
                tracing::debug!(index, "preview position gone, closing");
                self.close();
                false
            }
            Some(record) => record.id() != page_id || record.rotation() != rotation,
        }
    }
}

impl std::fmt::Debug for PreviewController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewController")
            .field("scale", &self.scale)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}
