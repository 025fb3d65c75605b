//! Magic wand selection using flood fill.
//!
//! Selects the region of similar colour around a seed pixel.

use image::Rgba;

use crate::error::Error;
use crate::imageops_cutout::crop_box::{update_bounds, Rect};
use crate::imageops_cutout::mask::Mask;
use crate::imageops_cutout::raster::{RasterBuffer, TRANSPARENT_ALPHA_THRESHOLD};

/// Selection mask with metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionStats {
    /// Selected pixels
    pub mask: Mask,
    /// Number of selected pixels
    pub pixel_count: usize,
    /// Tight bounds of the selection, `None` when nothing is selected
    pub bounds: Option<Rect>,
}

/// Trait providing magic wand selection on RGBA images
pub trait MagicWand {
    /// Selects the 4-connected region around the seed whose colours lie
    /// within `tolerance` of the seed colour
    ///
    /// A candidate matches when the L1 distance over RGBA is at most
    /// `tolerance * 4`. A seed with alpha below the transparency threshold
    /// matches only other transparent pixels, whatever their colour.
    ///
    /// # Arguments
    ///
    /// * `seed_x` - Seed column
    /// * `seed_y` - Seed row
    /// * `tolerance` - Colour tolerance, 0-100 is the useful range
    ///
    /// # Errors
    ///
    /// * `Error::OutOfBounds` - When the seed lies outside the image
    ///
    /// # Examples
    ///
    /// ```
    /// use imageops_cutout::{MagicWand, RasterBuffer};
    /// use image::Rgba;
    ///
    /// let image = RasterBuffer::from_fn(4, 4, |x, _| {
    ///     if x < 2 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) }
    /// });
    /// let mask = image.magic_wand(0, 0, 10).unwrap();
    /// assert_eq!(mask.foreground_count(), 8);
    /// ```
    fn magic_wand(&self, seed_x: u32, seed_y: u32, tolerance: u32) -> Result<Mask, Error>;

    /// Same as [`MagicWand::magic_wand`], also reporting count and bounds
    fn magic_wand_detailed(
        &self,
        seed_x: u32,
        seed_y: u32,
        tolerance: u32,
    ) -> Result<SelectionStats, Error>;

    /// Selects every pixel matching the seed colour, connected or not
    fn magic_wand_global(&self, seed_x: u32, seed_y: u32, tolerance: u32) -> Result<Mask, Error>;
}

impl MagicWand for RasterBuffer {
    fn magic_wand(&self, seed_x: u32, seed_y: u32, tolerance: u32) -> Result<Mask, Error> {
        self.magic_wand_detailed(seed_x, seed_y, tolerance)
            .map(|stats| stats.mask)
    }

    fn magic_wand_detailed(
        &self,
        seed_x: u32,
        seed_y: u32,
        tolerance: u32,
    ) -> Result<SelectionStats, Error> {
        let (width, height) = self.dimensions();
        let matcher = ColorMatcher::at_seed(self, seed_x, seed_y, tolerance)?;

        let w = width as usize;
        let mut selected = vec![false; w * height as usize];
        let mut visited = vec![false; w * height as usize];
        let mut stack = vec![(seed_x, seed_y)];
        visited[seed_y as usize * w + seed_x as usize] = true;

        let mut pixel_count = 0;
        let mut bounds = [width, height, 0, 0];

        while let Some((x, y)) = stack.pop() {
            if !matcher.matches(self.get_pixel(x, y)) {
                continue;
            }

            selected[y as usize * w + x as usize] = true;
            pixel_count += 1;
            update_bounds(&mut bounds, x, y);

            let neighbours = [
                (x.checked_sub(1), Some(y)),
                (x.checked_add(1).filter(|&nx| nx < width), Some(y)),
                (Some(x), y.checked_sub(1)),
                (Some(x), y.checked_add(1).filter(|&ny| ny < height)),
            ];
            for (nx, ny) in neighbours {
                let (Some(nx), Some(ny)) = (nx, ny) else {
                    continue;
                };
                let index = ny as usize * w + nx as usize;
                if !visited[index] {
                    visited[index] = true;
                    stack.push((nx, ny));
                }
            }
        }

        let mask = Mask::from_fn(width, height, |x, y| selected[y as usize * w + x as usize]);
        let bounds = (pixel_count > 0).then(|| Rect {
            x: bounds[0],
            y: bounds[1],
            width: bounds[2] - bounds[0] + 1,
            height: bounds[3] - bounds[1] + 1,
        });

        Ok(SelectionStats {
            mask,
            pixel_count,
            bounds,
        })
    }

    fn magic_wand_global(&self, seed_x: u32, seed_y: u32, tolerance: u32) -> Result<Mask, Error> {
        let matcher = ColorMatcher::at_seed(self, seed_x, seed_y, tolerance)?;
        let (width, height) = self.dimensions();
        Ok(Mask::from_fn(width, height, |x, y| {
            matcher.matches(self.get_pixel(x, y))
        }))
    }
}

/// Selects the flood-fill region around `(seed_x, seed_y)`.
///
/// Free-function form of [`MagicWand::magic_wand`].
pub fn select(
    buffer: &RasterBuffer,
    seed_x: u32,
    seed_y: u32,
    tolerance: u32,
) -> Result<Mask, Error> {
    buffer.magic_wand(seed_x, seed_y, tolerance)
}

struct ColorMatcher {
    seed: [u8; 4],
    max_distance: u32,
    transparent_seed: bool,
}

impl ColorMatcher {
    fn at_seed(
        image: &RasterBuffer,
        seed_x: u32,
        seed_y: u32,
        tolerance: u32,
    ) -> Result<Self, Error> {
        let (width, height) = image.dimensions();
        if seed_x >= width || seed_y >= height {
            return Err(Error::OutOfBounds {
                x: i64::from(seed_x),
                y: i64::from(seed_y),
                width,
                height,
            });
        }

        let seed = image.get_pixel(seed_x, seed_y).0;
        Ok(Self {
            seed,
            max_distance: tolerance.saturating_mul(4),
            transparent_seed: seed[3] < TRANSPARENT_ALPHA_THRESHOLD,
        })
    }

    #[inline]
    fn matches(&self, pixel: &Rgba<u8>) -> bool {
        if self.transparent_seed {
            return pixel[3] < TRANSPARENT_ALPHA_THRESHOLD;
        }

        let distance: u32 = pixel
            .0
            .iter()
            .zip(self.seed.iter())
            .map(|(&a, &b)| u32::from(a.abs_diff(b)))
            .sum();
        distance <= self.max_distance
    }
}
