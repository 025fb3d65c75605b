use image::Luma;
use itertools::iproduct;

use crate::error::Error;
use crate::imageops_cutout::mask::Mask;
use crate::Image;

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// One past the last column
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the last row
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x..self.right()).contains(&x) && (self.y..self.bottom()).contains(&y)
    }
}

/// Trait computing the padded bounding box of an image's content
pub trait CropBox {
    /// Finds the minimal box containing every selected (nonzero) pixel and
    /// grows it by `padding` on all sides, clamped to
    /// `[0, canvas_width) x [0, canvas_height)`
    ///
    /// # Errors
    ///
    /// * `Error::EmptySelection` - When no selected pixel lies on the canvas
    ///
    /// # Examples
    ///
    /// ```
    /// use imageops_cutout::{CropBox, Mask, Rect};
    ///
    /// let mask = Mask::from_fn(10, 10, |x, y| (4..6).contains(&x) && (4..6).contains(&y));
    /// let rect = mask.crop_box(1, 10, 10).unwrap();
    /// assert_eq!(rect, Rect { x: 3, y: 3, width: 4, height: 4 });
    /// ```
    fn crop_box(&self, padding: u32, canvas_width: u32, canvas_height: u32) -> Result<Rect, Error>;
}

impl CropBox for Image<Luma<u8>> {
    fn crop_box(&self, padding: u32, canvas_width: u32, canvas_height: u32) -> Result<Rect, Error> {
        find_content_bounds(self)
            .and_then(|bounds| clip_to_canvas(bounds, canvas_width, canvas_height))
            .map(|bounds| pad_bounds(bounds, padding, canvas_width, canvas_height))
            .ok_or(Error::EmptySelection)
    }
}

impl CropBox for Mask {
    fn crop_box(&self, padding: u32, canvas_width: u32, canvas_height: u32) -> Result<Rect, Error> {
        self.as_image()
            .crop_box(padding, canvas_width, canvas_height)
    }
}

/// Free-function form of [`CropBox::crop_box`].
pub fn compute_crop_box<C: CropBox>(
    map: &C,
    padding: u32,
    canvas_width: u32,
    canvas_height: u32,
) -> Result<Rect, Error> {
    map.crop_box(padding, canvas_width, canvas_height)
}

/// Inclusive `[x1, y1, x2, y2]` bounds of the nonzero pixels
fn find_content_bounds(image: &Image<Luma<u8>>) -> Option<[u32; 4]> {
    let (width, height) = image.dimensions();
    let mut bounds = [width, height, 0, 0];
    let mut found = false;

    for (y, x) in iproduct!(0..height, 0..width) {
        if image.get_pixel(x, y)[0] > 0 {
            update_bounds(&mut bounds, x, y);
            found = true;
        }
    }

    found.then_some(bounds)
}

/// Bounds restricted to the canvas, `None` when they miss it entirely
fn clip_to_canvas(bounds: [u32; 4], canvas_width: u32, canvas_height: u32) -> Option<[u32; 4]> {
    let [x1, y1, x2, y2] = bounds;
    if x1 >= canvas_width || y1 >= canvas_height {
        return None;
    }
    Some([x1, y1, x2.min(canvas_width - 1), y2.min(canvas_height - 1)])
}

fn pad_bounds(bounds: [u32; 4], padding: u32, canvas_width: u32, canvas_height: u32) -> Rect {
    let [x1, y1, x2, y2] = bounds;
    let left = x1.saturating_sub(padding);
    let top = y1.saturating_sub(padding);
    let right = x2
        .saturating_add(padding)
        .min(canvas_width.saturating_sub(1));
    let bottom = y2
        .saturating_add(padding)
        .min(canvas_height.saturating_sub(1));

    Rect {
        x: left,
        y: top,
        width: right.saturating_sub(left) + 1,
        height: bottom.saturating_sub(top) + 1,
    }
}

pub(crate) fn update_bounds(bounds: &mut [u32; 4], x: u32, y: u32) {
    bounds[0] = bounds[0].min(x);
    bounds[1] = bounds[1].min(y);
    bounds[2] = bounds[2].max(x);
    bounds[3] = bounds[3].max(y);
}
