use tracing::debug;

use crate::error::Error;
use crate::imageops_cutout::apply_alpha_mask::IntersectAlpha;
use crate::imageops_cutout::crop_box::{CropBox, Rect};
use crate::imageops_cutout::feather::Feather;
use crate::imageops_cutout::mask::{AlphaMap, Mask};
use crate::imageops_cutout::morphology::Morphology;
use crate::imageops_cutout::policy::ExtractionPolicy;
use crate::imageops_cutout::raster::RasterBuffer;

/// A finished cutout and where it sits on the source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub image: RasterBuffer,
    /// Region of the source covered by `image`
    pub origin: Rect,
}

/// Cuts the masked object out of `source`.
///
/// The mask is resampled to the source size, grown or shrunk by
/// `policy.dilation`, feathered by `policy.feather`, and intersected with the
/// source alpha. With `policy.crop` the result is reduced to the bounding box
/// of its non-transparent pixels plus `policy.padding`; otherwise it keeps the
/// source dimensions with everything outside the selection transparent.
/// `source` is never modified.
///
/// # Errors
///
/// * `Error::InvalidPolicy` - Before any pixel work, when the policy is out of range
/// * `Error::EmptySelection` - When cropping and no pixel survives
///
/// # Examples
///
/// ```
/// use imageops_cutout::{extract, ExtractionPolicy, Mask, RasterBuffer};
/// use image::Rgba;
///
/// let source = RasterBuffer::from_pixel(8, 8, Rgba([0, 128, 255, 255]));
/// let mask = Mask::from_fn(8, 8, |x, y| (2..5).contains(&x) && (3..6).contains(&y));
///
/// let cutout = extract(&source, &mask, &ExtractionPolicy::default()).unwrap();
/// assert_eq!(cutout.dimensions(), (3, 3));
/// ```
pub fn extract(
    source: &RasterBuffer,
    mask: &Mask,
    policy: &ExtractionPolicy,
) -> Result<RasterBuffer, Error> {
    extract_with_origin(source, mask, policy).map(|extraction| extraction.image)
}

/// Same as [`extract`], also reporting the region of the source the cutout covers.
pub fn extract_with_origin(
    source: &RasterBuffer,
    mask: &Mask,
    policy: &ExtractionPolicy,
) -> Result<Extraction, Error> {
    policy.validate()?;

    let (width, height) = source.dimensions();
    let alpha = post_process(mask, policy, width, height);
    let cut = source.intersect_alpha(&alpha)?;

    if !policy.crop {
        debug!(width, height, "extracted without crop");
        return Ok(Extraction {
            image: cut,
            origin: Rect {
                x: 0,
                y: 0,
                width,
                height,
            },
        });
    }

    let origin = alpha_channel(&cut).crop_box(policy.padding, width, height)?;
    let image = image::imageops::crop_imm(&cut, origin.x, origin.y, origin.width, origin.height)
        .to_image();

    debug!(
        x = origin.x,
        y = origin.y,
        width = origin.width,
        height = origin.height,
        "extracted cropped cutout"
    );
    Ok(Extraction { image, origin })
}

/// Resample, dilate/erode and feather a mask into the alpha map used for the cut.
///
/// Dilation runs before feathering so the soft edge is measured from the
/// adjusted boundary.
pub fn post_process(mask: &Mask, policy: &ExtractionPolicy, width: u32, height: u32) -> AlphaMap {
    mask.resize_nearest(width, height)
        .dilate_erode(policy.dilation)
        .feather(policy.feather)
}

fn alpha_channel(image: &RasterBuffer) -> AlphaMap {
    AlphaMap::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([image.get_pixel(x, y)[3]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{self, CLEAR, RED};

    fn red_square_canvas() -> RasterBuffer {
        test_utils::square_canvas(40, 10, 30, CLEAR)
    }

    fn square_mask() -> Mask {
        test_utils::square_mask(40, 10, 30)
    }

    #[test]
    fn test_extract_crops_to_content() {
        let result = extract_with_origin(
            &red_square_canvas(),
            &square_mask(),
            &ExtractionPolicy::default(),
        )
        .unwrap();

        assert_eq!(result.image.dimensions(), (20, 20));
        assert_eq!(
            result.origin,
            Rect {
                x: 10,
                y: 10,
                width: 20,
                height: 20
            }
        );
        assert!(result.image.pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_extract_without_crop_keeps_size() {
        let policy = ExtractionPolicy::default().with_crop(false);
        let mask = Mask::from_fn(40, 40, |x, _| x < 20);
        let result = extract(&red_square_canvas(), &mask, &policy).unwrap();

        assert_eq!(result.dimensions(), (40, 40));
        assert_eq!(result.get_pixel(15, 15)[3], 255);
        assert_eq!(result.get_pixel(25, 15)[3], 0);
        assert_eq!(result.get_pixel(25, 15)[0], 255);
    }

    #[test]
    fn test_extract_empty_selection() {
        let empty = Mask::new(40, 40);
        assert_eq!(
            extract(&red_square_canvas(), &empty, &ExtractionPolicy::default()),
            Err(Error::EmptySelection)
        );

        let uncropped = ExtractionPolicy::default().with_crop(false);
        let transparent = extract(&red_square_canvas(), &empty, &uncropped).unwrap();
        assert!(transparent.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_extract_erosion_can_erase_selection() {
        let thin = Mask::from_fn(40, 40, |_, y| y == 20);
        let policy = ExtractionPolicy::default().with_dilation(-1);
        assert_eq!(
            extract(&red_square_canvas(), &thin, &policy),
            Err(Error::EmptySelection)
        );
    }

    #[test]
    fn test_extract_invalid_policy_rejected_first() {
        let policy = ExtractionPolicy::default().with_padding(u32::MAX);
        assert!(matches!(
            extract(&red_square_canvas(), &Mask::new(1, 1), &policy),
            Err(Error::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_extract_resamples_low_resolution_mask() {
        let low_res = Mask::from_fn(4, 4, |x, y| (1..3).contains(&x) && (1..3).contains(&y));
        let result = extract(&red_square_canvas(), &low_res, &ExtractionPolicy::default()).unwrap();
        assert_eq!(result.dimensions(), (20, 20));
    }

    #[test]
    fn test_extract_crop_ignores_transparent_source_pixels() {
        // Mask covers more than the opaque square; the crop follows the
        // surviving alpha, not the mask.
        let wide = Mask::from_fn(40, 40, |x, y| (5..35).contains(&x) && (5..35).contains(&y));
        let result = extract(&red_square_canvas(), &wide, &ExtractionPolicy::default()).unwrap();
        assert_eq!(result.dimensions(), (20, 20));
    }
}
