//! Property-based tests for imageops-cutout
//!
//! These tests use proptest to verify the invariants that should hold for all
//! inputs to the selection, mask and extraction operations.

use image::Rgba;
use imageops_cutout::{
    extract_with_origin, merge, CropBox, ExtractionPolicy, Feather, MagicWand, Mask, MergeOp,
    Morphology, RasterBuffer,
};
use proptest::prelude::*;

/// Strategy for generating small but valid image dimensions
fn image_dimensions() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=24, 1u32..=24)
}

/// Strategy for generating RGBA pixel values from a small palette so flood
/// fills produce regions of interesting size
fn palette_pixel() -> impl Strategy<Value = Rgba<u8>> {
    prop_oneof![
        Just(Rgba([255, 0, 0, 255])),
        Just(Rgba([250, 5, 0, 255])),
        Just(Rgba([0, 0, 255, 255])),
        Just(Rgba([255, 255, 255, 255])),
        Just(Rgba([0, 0, 0, 0])),
        (any::<u8>(), any::<u8>(), any::<u8>(), any::<u8>())
            .prop_map(|(r, g, b, a)| Rgba([r, g, b, a])),
    ]
}

fn raster() -> impl Strategy<Value = RasterBuffer> {
    image_dimensions().prop_flat_map(|(width, height)| {
        prop::collection::vec(palette_pixel(), (width * height) as usize).prop_map(
            move |pixels| {
                RasterBuffer::from_fn(width, height, |x, y| pixels[(y * width + x) as usize])
            },
        )
    })
}

fn mask_with_dimensions(width: u32, height: u32) -> impl Strategy<Value = Mask> {
    prop::collection::vec(any::<bool>(), (width * height) as usize).prop_map(move |bits| {
        Mask::from_fn(width, height, |x, y| bits[(y * width + x) as usize])
    })
}

fn mask() -> impl Strategy<Value = Mask> {
    image_dimensions().prop_flat_map(|(width, height)| mask_with_dimensions(width, height))
}

fn mask_pair() -> impl Strategy<Value = (Mask, Mask)> {
    image_dimensions().prop_flat_map(|(width, height)| {
        (
            mask_with_dimensions(width, height),
            mask_with_dimensions(width, height),
        )
    })
}

fn is_subset(inner: &Mask, outer: &Mask) -> bool {
    let (width, height) = inner.dimensions();
    (0..height)
        .all(|y| (0..width).all(|x| !inner.is_foreground(x, y) || outer.is_foreground(x, y)))
}

proptest! {
    #[test]
    fn flood_fill_always_selects_seed(
        image in raster(),
        seed in (0u32..24, 0u32..24),
        tolerance in 0u32..=100,
    ) {
        let (x, y) = (seed.0 % image.width(), seed.1 % image.height());
        let mask = image.magic_wand(x, y, tolerance).unwrap();

        prop_assert_eq!(mask.dimensions(), image.dimensions());
        prop_assert!(mask.is_foreground(x, y));
    }

    #[test]
    fn flood_fill_grows_with_tolerance(
        image in raster(),
        seed in (0u32..24, 0u32..24),
        low in 0u32..=50,
        extra in 0u32..=50,
    ) {
        let (x, y) = (seed.0 % image.width(), seed.1 % image.height());
        let narrow = image.magic_wand(x, y, low).unwrap();
        let wide = image.magic_wand(x, y, low + extra).unwrap();

        prop_assert!(is_subset(&narrow, &wide));
    }

    #[test]
    fn flood_fill_is_within_global_selection(
        image in raster(),
        seed in (0u32..24, 0u32..24),
        tolerance in 0u32..=100,
    ) {
        let (x, y) = (seed.0 % image.width(), seed.1 % image.height());
        let contiguous = image.magic_wand(x, y, tolerance).unwrap();
        let global = image.magic_wand_global(x, y, tolerance).unwrap();

        prop_assert!(is_subset(&contiguous, &global));
    }

    #[test]
    fn flood_fill_is_idempotent(
        image in raster(),
        seed in (0u32..24, 0u32..24),
        tolerance in 0u32..=100,
    ) {
        let (x, y) = (seed.0 % image.width(), seed.1 % image.height());
        let first = image.magic_wand(x, y, tolerance).unwrap();
        let second = image.magic_wand(x, y, tolerance).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn flood_fill_stats_agree_with_mask(
        image in raster(),
        seed in (0u32..24, 0u32..24),
    ) {
        let (x, y) = (seed.0 % image.width(), seed.1 % image.height());
        let stats = image.magic_wand_detailed(x, y, 20).unwrap();
        let bounds = stats.bounds.unwrap();

        prop_assert_eq!(stats.pixel_count, stats.mask.foreground_count());
        prop_assert!(bounds.contains(x, y));
    }

    #[test]
    fn merge_without_existing_is_identity(mask in mask()) {
        prop_assert_eq!(merge(None, &mask, MergeOp::Add), mask.clone());
        prop_assert_eq!(merge(None, &mask, MergeOp::Subtract), mask);
    }

    #[test]
    fn merge_add_is_union((a, b) in mask_pair()) {
        let union = merge(Some(&a), &b, MergeOp::Add);

        prop_assert!(is_subset(&a, &union));
        prop_assert!(is_subset(&b, &union));
        prop_assert_eq!(union, merge(Some(&b), &a, MergeOp::Add));
    }

    #[test]
    fn merge_subtract_removes_incoming((a, b) in mask_pair()) {
        let difference = merge(Some(&a), &b, MergeOp::Subtract);

        prop_assert!(is_subset(&difference, &a));
        prop_assert_eq!(
            merge(Some(&difference), &b, MergeOp::Add),
            merge(Some(&a), &b, MergeOp::Add)
        );
    }

    #[test]
    fn add_then_subtract_self_is_empty(mask in mask()) {
        let doubled = merge(Some(&mask), &mask, MergeOp::Add);
        prop_assert!(merge(Some(&doubled), &mask, MergeOp::Subtract).is_empty());
    }

    #[test]
    fn dilation_and_erosion_bracket_mask(mask in mask(), radius in 1u32..=5) {
        prop_assert!(is_subset(&mask, &mask.dilate(radius)));
        prop_assert!(is_subset(&mask.erode(radius), &mask));
    }

    #[test]
    fn closing_contains_mask(mask in mask(), radius in 1u32..=5) {
        let closed = mask.dilate(radius).erode(radius);
        prop_assert!(is_subset(&mask, &closed));
    }

    #[test]
    fn zero_dilation_is_identity(mask in mask()) {
        prop_assert_eq!(mask.dilate_erode(0), mask);
    }

    #[test]
    fn feather_stays_inside_selection(mask in mask(), width in 0u32..=20) {
        let alpha = mask.feather(width);

        for (x, y, value) in alpha.enumerate_pixels() {
            if mask.is_foreground(x, y) {
                prop_assert!(value[0] > 0);
            } else {
                prop_assert_eq!(value[0], 0);
            }
        }
    }

    #[test]
    fn feather_rises_then_falls_across_a_rectangle(
        (width, height) in (4u32..=32, 4u32..=32),
        corners in (0u32..32, 0u32..32, 0u32..32, 0u32..32),
        feather_width in 0u32..=12,
    ) {
        let (left, right) = {
            let (a, b) = (corners.0 % width, corners.1 % width);
            (a.min(b), a.max(b) + 1)
        };
        let (top, bottom) = {
            let (a, b) = (corners.2 % height, corners.3 % height);
            (a.min(b), a.max(b) + 1)
        };
        let mask = Mask::from_fn(width, height, |x, y| {
            (left..right).contains(&x) && (top..bottom).contains(&y)
        });
        let alpha = mask.feather(feather_width);

        // Along any row or column through the rectangle, alpha climbs from the
        // boundary towards the middle and falls again, never the other way.
        let row = (top + bottom) / 2;
        let column = (left + right) / 2;
        let lines = [
            (0..width).map(|x| alpha.get_pixel(x, row)[0]).collect::<Vec<_>>(),
            (0..height).map(|y| alpha.get_pixel(column, y)[0]).collect::<Vec<_>>(),
        ];
        for line in lines {
            let peak = line
                .iter()
                .enumerate()
                .max_by_key(|&(_, value)| *value)
                .map(|(index, _)| index)
                .unwrap();
            prop_assert!(line[..=peak].windows(2).all(|pair| pair[0] <= pair[1]));
            prop_assert!(line[peak..].windows(2).all(|pair| pair[0] >= pair[1]));
        }
    }

    #[test]
    fn crop_box_contains_content(mask in mask(), padding in 0u32..=8) {
        let (width, height) = mask.dimensions();
        match mask.crop_box(padding, width, height) {
            Ok(rect) => {
                prop_assert!(rect.right() <= width && rect.bottom() <= height);
                for y in 0..height {
                    for x in 0..width {
                        if mask.is_foreground(x, y) {
                            prop_assert!(rect.contains(x, y));
                        }
                    }
                }
            }
            Err(_) => prop_assert!(mask.is_empty()),
        }
    }

    #[test]
    fn extraction_never_raises_alpha(
        image in raster(),
        bits in prop::collection::vec(any::<bool>(), 24 * 24),
        dilation in -3i32..=3,
        feather in 0u32..=4,
        padding in 0u32..=4,
    ) {
        let (width, height) = image.dimensions();
        let mask = Mask::from_fn(width, height, |x, y| bits[(y * 24 + x) as usize]);
        let policy = ExtractionPolicy::default()
            .with_dilation(dilation)
            .with_feather(feather)
            .with_padding(padding);

        if let Ok(extraction) = extract_with_origin(&image, &mask, &policy) {
            let origin = extraction.origin;
            prop_assert_eq!(extraction.image.dimensions(), (origin.width, origin.height));

            for (x, y, pixel) in extraction.image.enumerate_pixels() {
                let source = image.get_pixel(origin.x + x, origin.y + y);
                prop_assert!(pixel[3] <= source[3]);
                prop_assert_eq!(&pixel.0[..3], &source.0[..3]);
            }
        }
    }
}
