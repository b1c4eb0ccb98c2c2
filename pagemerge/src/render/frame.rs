//! Page-frame renderer.

use image::imageops;
use image::{Rgba, RgbaImage};

use super::PageRenderer;
use crate::error::{PageMergeError, Result};
use crate::pages::Rotation;
use crate::source::SourceBytes;
use crate::utils::pdf;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BORDER: Rgba<u8> = Rgba([160, 160, 160, 255]);
const MARKER: Rgba<u8> = Rgba([40, 40, 40, 255]);

/// Renders the frame of a page: a white sheet of the page's size with a
/// border and a marker in the unrotated top-left corner.
///
/// It does not draw page content, but the bitmap has the exact dimensions
/// and orientation a content rasterizer would produce, so it doubles as a
/// layout placeholder.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    max_side: u32,
}

impl FrameRenderer {
    /// Largest bitmap side produced, in pixels.
    pub const DEFAULT_MAX_SIDE: u32 = 4096;

    /// Create a renderer with the default size cap.
    pub fn new() -> Self {
        Self {
            max_side: Self::DEFAULT_MAX_SIDE,
        }
    }

    /// Create a renderer that never produces a side longer than `max_side`.
    pub fn with_max_side(max_side: u32) -> Self {
        Self {
            max_side: max_side.max(1),
        }
    }

    fn pixels(&self, points: f32, scale: f32) -> u32 {
        let px = (points * scale).round();
        if px.is_finite() {
            (px as u32).clamp(1, self.max_side)
        } else {
            1
        }
    }

    fn paint(width: u32, height: u32) -> RgbaImage {
        let mut sheet = RgbaImage::from_pixel(width, height, PAPER);

        for x in 0..width {
            sheet.put_pixel(x, 0, BORDER);
            sheet.put_pixel(x, height - 1, BORDER);
        }
        for y in 0..height {
            sheet.put_pixel(0, y, BORDER);
            sheet.put_pixel(width - 1, y, BORDER);
        }

        let marker = (width.min(height) / 8).max(1);
        for y in 0..marker.min(height) {
            for x in 0..marker.min(width) {
                sheet.put_pixel(x, y, MARKER);
            }
        }

        sheet
    }
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer for FrameRenderer {
    fn render(
        &self,
        bytes: &SourceBytes,
        page_index: usize,
        scale: f32,
        rotation: Rotation,
    ) -> Result<RgbaImage> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(PageMergeError::other(format!("invalid render scale {scale}")));
        }

        let doc = pdf::load_document(bytes.as_ref())
            .map_err(|e| PageMergeError::other(format!("cannot parse document: {e}")))?;
        let pages = pdf::page_ids(&doc);
        let page_id = *pages.get(page_index).ok_or_else(|| {
            PageMergeError::other(format!(
                "page {} requested but the document has {} page(s)",
                page_index + 1,
                pages.len()
            ))
        })?;

        let (width, height) = pdf::page_size(&doc, page_id);
        let sheet = Self::paint(self.pixels(width, scale), self.pixels(height, scale));

        Ok(match rotation {
            Rotation::None => sheet,
            Rotation::Clockwise90 => imageops::rotate90(&sheet),
            Rotation::Rotate180 => imageops::rotate180(&sheet),
            Rotation::Clockwise270 => imageops::rotate270(&sheet),
        })
    }
}
