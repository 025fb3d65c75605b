//! Seams towards the editor embedding the cutout workflow.

use std::fmt;

use image::Rgba;

use crate::error::SessionError;
use crate::imageops_cutout::classify::Category;
use crate::imageops_cutout::crop_box::Rect;
use crate::imageops_cutout::mask::Mask;
use crate::imageops_cutout::raster::RasterBuffer;

/// Default overlay colour: semi-transparent red
pub const DEFAULT_OVERLAY: Rgba<u8> = Rgba([255, 0, 0, 128]);

/// User-facing messages a session may raise
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A gesture landed outside the image
    InvalidPoint,
    /// The segmenter found nothing at the prompt
    NoObjectDetected,
    /// Commit found nothing left to extract
    NothingToExtract,
    /// The segmenter failed; the gesture can be retried
    BackendUnavailable(String),
}

impl Notice {
    /// Maps a session error to the message shown for it, if any
    pub fn from_error(error: &SessionError) -> Option<Self> {
        use crate::error::Error;

        match error {
            SessionError::Pipeline(Error::OutOfBounds { .. }) | SessionError::EmptyGesture => {
                Some(Self::InvalidPoint)
            }
            SessionError::Pipeline(Error::EmptySelection) => Some(Self::NothingToExtract),
            SessionError::NoObjectDetected => Some(Self::NoObjectDetected),
            SessionError::BackendUnavailable(reason) => {
                Some(Self::BackendUnavailable(reason.clone()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPoint => f.write_str("Please select a point on the image"),
            Self::NoObjectDetected => f.write_str("No object detected at the selected point"),
            Self::NothingToExtract => f.write_str("Nothing to extract"),
            Self::BackendUnavailable(_) => {
                f.write_str("Segmentation is unavailable right now, try again")
            }
        }
    }
}

/// The editor side of a session
///
/// Called from the task driving the session, so implementations should hand
/// work off to their UI thread rather than block.
pub trait EditorHost: Send {
    /// Shows the current selection
    fn preview_mask(&mut self, mask: &Mask);

    /// Receives the finished cutout and the source region it covers
    fn commit_extraction(&mut self, image: &RasterBuffer, origin: Rect);

    fn report(&mut self, _notice: &Notice) {}

    /// Receives the category of a committed cutout, when a classifier runs
    fn categorize(&mut self, _origin: Rect, _category: Category) {}
}

/// Pan and zoom of the canvas showing the source image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// Maps a canvas-space pointer position to image-space pixels.
    ///
    /// The result is not bounds-checked; sessions reject points outside the
    /// image.
    pub fn canvas_to_image(&self, canvas_x: f64, canvas_y: f64) -> (f64, f64) {
        (
            (canvas_x - self.pan_x) / self.zoom,
            (canvas_y - self.pan_y) / self.zoom,
        )
    }

    pub fn image_to_canvas(&self, image_x: f64, image_y: f64) -> (f64, f64) {
        (
            image_x * self.zoom + self.pan_x,
            image_y * self.zoom + self.pan_y,
        )
    }
}

/// Tints the selected part of `source` with `color` for previewing.
///
/// `color`'s alpha controls the tint strength. The mask is resampled to the
/// source if needed.
pub fn render_overlay(source: &RasterBuffer, mask: &Mask, color: Rgba<u8>) -> RasterBuffer {
    let (width, height) = source.dimensions();
    let mask = mask.resize_nearest(width, height);

    let mut preview = source.clone();
    for (x, y, pixel) in preview.enumerate_pixels_mut() {
        if mask.is_foreground(x, y) {
            *pixel = blend_over(*pixel, color);
        }
    }
    preview
}

/// Source-over compositing of `overlay` onto `base`
fn blend_over(base: Rgba<u8>, overlay: Rgba<u8>) -> Rgba<u8> {
    let overlay_alpha = f32::from(overlay[3]) / 255.0;
    let base_alpha = f32::from(base[3]) / 255.0;
    let out_alpha = overlay_alpha + base_alpha * (1.0 - overlay_alpha);

    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |b: u8, o: u8| {
        let value = (f32::from(o) * overlay_alpha
            + f32::from(b) * base_alpha * (1.0 - overlay_alpha))
            / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(base[0], overlay[0]),
        channel(base[1], overlay[1]),
        channel(base[2], overlay[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
