//! Page rendering.
//!
//! Rasterization is a capability the engine consumes, not something it
//! implements: anything that can turn "page N of these bytes, at this scale
//! and rotation" into a bitmap can be plugged in through [`PageRenderer`].
//! [`FrameRenderer`] is the built-in implementation; it produces the page's
//! outline with correct geometry and orientation, which is all the CLI needs
//! for contact sheets and all the tests need to check rotation handling.
//!
//! Renders are blocking work and always run on tokio's blocking pool via
//! [`render_page`].

mod frame;

pub use frame::FrameRenderer;

use image::RgbaImage;
use std::sync::Arc;
use tokio::task;

use crate::error::{PageMergeError, Result};
use crate::pages::{PageRecord, Rotation, ThumbnailState};
use crate::source::SourceBytes;

/// Something that can rasterize a page of a PDF.
pub trait PageRenderer: Send + Sync {
    /// Render page `page_index` (zero-based) of `bytes`.
    ///
    /// `rotation` turns the output clockwise; [`Rotation::None`] renders the
    /// page's unrotated content.
    ///
    /// # Errors
    ///
    /// Implementations return an error for malformed documents and
    /// out-of-range pages. Callers treat this as a per-page failure.
    fn render(
        &self,
        bytes: &SourceBytes,
        page_index: usize,
        scale: f32,
        rotation: Rotation,
    ) -> Result<RgbaImage>;
}

/// Everything needed to render one page, detached from the collection.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Source file name, for error reporting.
    pub file: String,
    /// Own handle to the source bytes.
    pub bytes: SourceBytes,
    /// Zero-based page index.
    pub page_index: usize,
    /// Output scale (1.0 = one pixel per PDF point).
    pub scale: f32,
    /// Rotation to render with.
    pub rotation: Rotation,
}

impl RenderRequest {
    /// Build a request for a page record at the given scale.
    pub fn for_record(record: &PageRecord, scale: f32) -> Self {
        Self {
            file: record.source().name().to_string(),
            bytes: record.source().bytes(),
            page_index: record.source_page_index(),
            scale,
            rotation: record.rotation(),
        }
    }
}

/// Render a page on the blocking pool.
///
/// # Errors
///
/// Returns [`PageMergeError::RenderFailed`] naming the file and page if the
/// renderer rejects the page or the task dies.
pub async fn render_page(
    renderer: Arc<dyn PageRenderer>,
    request: RenderRequest,
) -> Result<RgbaImage> {
    let file = request.file.clone();
    let page_index = request.page_index;

    task::spawn_blocking(move || {
        renderer
            .render(
                &request.bytes,
                request.page_index,
                request.scale,
                request.rotation,
            )
            .map_err(|e| match e {
                PageMergeError::RenderFailed { .. } => e,
                other => PageMergeError::render_failed(
                    &request.file,
                    request.page_index,
                    other.to_string(),
                ),
            })
    })
    .await
    .map_err(|e| {
        PageMergeError::render_failed(file, page_index, format!("render task failed: {e}"))
    })?
}

/// Render a page and fold the outcome into a thumbnail slot.
///
/// Failures are logged and stored; they never propagate.
pub async fn render_thumbnail(
    renderer: Arc<dyn PageRenderer>,
    request: RenderRequest,
) -> ThumbnailState {
    let rotation = request.rotation;
    let file = request.file.clone();
    let page = request.page_index + 1;

    match render_page(renderer, request).await {
        Ok(image) => ThumbnailState::Ready {
            image: Arc::new(image),
            rotation,
        },
        Err(e) => {
            tracing::warn!(file = %file, page, error = %e, "page could not be rendered");
            ThumbnailState::Failed {
                reason: e.to_string(),
            }
        }
    }
}
