use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SegmenterError;
use crate::imageops_cutout::magic_wand::MagicWand;
use crate::imageops_cutout::mask::{CategoryMask, Mask};
use crate::imageops_cutout::mask_algebra::{merge, MergeOp};
use crate::imageops_cutout::raster::RasterBuffer;
use crate::utils::pixel_at;

/// Whether a prompt point marks the object or something to leave out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PointLabel {
    Positive,
    Negative,
}

/// A user hint in image-space pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PromptPoint {
    pub x: f64,
    pub y: f64,
    pub label: PointLabel,
}

impl PromptPoint {
    pub fn positive(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            label: PointLabel::Positive,
        }
    }

    pub fn negative(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            label: PointLabel::Negative,
        }
    }
}

/// Result of one segmentation request
///
/// `Ok(None)` means the backend found no confident foreground near the
/// prompt; it is not an error.
pub type SegmentResult = Result<Option<CategoryMask>, SegmenterError>;

/// A point- or stroke-prompted foreground segmenter
///
/// Model inference can take from hundreds of milliseconds to seconds, so
/// both prompt methods are asynchronous. Implementations must check `cancel`
/// before resolving and return `SegmenterError::Cancelled` once it fires.
/// Masks may come back at any resolution; callers resample them.
pub trait PromptSegmenter: Send + Sync {
    /// Loads the model. Idempotent: only the first call does any work.
    fn initialize(&self) -> impl Future<Output = Result<(), SegmenterError>> + Send;

    /// Segments the object under a single click.
    fn segment_with_point(
        &self,
        image: &RasterBuffer,
        x: f64,
        y: f64,
        cancel: &CancellationToken,
    ) -> impl Future<Output = SegmentResult> + Send;

    /// Segments the object traced by an ordered stroke or set of clicks.
    fn segment_with_scribbles(
        &self,
        image: &RasterBuffer,
        points: &[PromptPoint],
        cancel: &CancellationToken,
    ) -> impl Future<Output = SegmentResult> + Send;
}

/// Segmenter backed by the magic wand instead of a model
///
/// A point prompt selects the flood-fill region under the point. A scribble
/// adds the regions under its positive points and removes the regions under
/// its negative ones. A selection covering the whole image is reported as
/// "no object", since nothing stands out from the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodFillSegmenter {
    pub tolerance: u32,
}

impl Default for FloodFillSegmenter {
    fn default() -> Self {
        Self { tolerance: 32 }
    }
}

impl FloodFillSegmenter {
    pub fn new(tolerance: u32) -> Self {
        Self { tolerance }
    }

    fn select(&self, image: &RasterBuffer, point: &PromptPoint) -> Result<Mask, SegmenterError> {
        let (width, height) = image.dimensions();
        let (x, y) = pixel_at(point.x, point.y, width, height)
            .map_err(|error| SegmenterError::BackendUnavailable(error.to_string()))?;
        image
            .magic_wand(x, y, self.tolerance)
            .map_err(|error| SegmenterError::BackendUnavailable(error.to_string()))
    }

    fn finish(&self, image: &RasterBuffer, mask: Option<Mask>) -> SegmentResult {
        let total = image.width() as usize * image.height() as usize;
        Ok(mask
            .filter(|mask| {
                let count = mask.foreground_count();
                debug!(count, total, "flood fill selection");
                count > 0 && count < total
            })
            .map(|mask| mask.to_category_mask()))
    }
}

impl PromptSegmenter for FloodFillSegmenter {
    async fn initialize(&self) -> Result<(), SegmenterError> {
        Ok(())
    }

    async fn segment_with_point(
        &self,
        image: &RasterBuffer,
        x: f64,
        y: f64,
        cancel: &CancellationToken,
    ) -> SegmentResult {
        let mask = self.select(image, &PromptPoint::positive(x, y))?;
        if cancel.is_cancelled() {
            return Err(SegmenterError::Cancelled);
        }
        self.finish(image, Some(mask))
    }

    async fn segment_with_scribbles(
        &self,
        image: &RasterBuffer,
        points: &[PromptPoint],
        cancel: &CancellationToken,
    ) -> SegmentResult {
        let mut running: Option<Mask> = None;
        for point in points {
            if cancel.is_cancelled() {
                return Err(SegmenterError::Cancelled);
            }
            let region = self.select(image, point)?;
            let merged = match (point.label, running.take()) {
                (PointLabel::Positive, current) => merge(current.as_ref(), &region, MergeOp::Add),
                (PointLabel::Negative, Some(current)) => {
                    merge(Some(&current), &region, MergeOp::Subtract)
                }
                // Nothing to carve out of yet.
                (PointLabel::Negative, None) => continue,
            };
            running = Some(merged);
        }

        if cancel.is_cancelled() {
            return Err(SegmenterError::Cancelled);
        }
        self.finish(image, running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{two_squares, WHITE};

    #[tokio::test]
    async fn test_flood_fill_point_returns_category_mask() {
        let segmenter = FloodFillSegmenter::default();
        let token = CancellationToken::new();
        let category = segmenter
            .segment_with_point(&two_squares(), 4.5, 4.5, &token)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(category.dimensions(), (30, 10));
        let mask = Mask::from(category);
        assert_eq!(mask.foreground_count(), 36);
        assert!(mask.is_foreground(2, 2));
        assert!(!mask.is_foreground(20, 2));
    }

    #[tokio::test]
    async fn test_flood_fill_uniform_image_finds_nothing() {
        let blank = RasterBuffer::from_pixel(16, 16, WHITE);
        let result = FloodFillSegmenter::default()
            .segment_with_point(&blank, 3.0, 3.0, &CancellationToken::new())
            .await;
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_flood_fill_scribbles_union_and_negative() {
        let segmenter = FloodFillSegmenter::default();
        let image = two_squares();
        let token = CancellationToken::new();

        let both = segmenter
            .segment_with_scribbles(
                &image,
                &[PromptPoint::positive(3.0, 3.0), PromptPoint::positive(21.0, 3.0)],
                &token,
            )
            .await
            .unwrap()
            .map(Mask::from)
            .unwrap();
        assert_eq!(both.foreground_count(), 72);

        let one = segmenter
            .segment_with_scribbles(
                &image,
                &[
                    PromptPoint::positive(3.0, 3.0),
                    PromptPoint::positive(21.0, 3.0),
                    PromptPoint::negative(22.0, 4.0),
                ],
                &token,
            )
            .await
            .unwrap()
            .map(Mask::from)
            .unwrap();
        assert_eq!(one.foreground_count(), 36);
    }

    #[tokio::test]
    async fn test_flood_fill_respects_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let result = FloodFillSegmenter::default()
            .segment_with_point(&two_squares(), 4.0, 4.0, &token)
            .await;
        assert_eq!(result, Err(SegmenterError::Cancelled));
    }

    #[tokio::test]
    async fn test_flood_fill_point_outside_image_is_backend_error() {
        let result = FloodFillSegmenter::default()
            .segment_with_point(&two_squares(), 99.0, 4.0, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(SegmenterError::BackendUnavailable(_))));
    }
}
