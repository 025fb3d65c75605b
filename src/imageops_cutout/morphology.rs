//! Morphological dilation and erosion of masks.
//!
//! Both directions use a disc of the requested radius as structuring
//! element. Instead of scanning the disc around every pixel, the squared
//! Euclidean distance to the nearest foreground (or background) pixel is
//! computed once with a distance transform and thresholded, so the cost does
//! not grow with the radius.

use crate::imageops_cutout::mask::{Mask, BACKGROUND, FOREGROUND};
use crate::utils::{map_with_distance, squared_distance_to_nonzero};

/// Trait providing morphological operations on masks
pub trait Morphology {
    /// Grows (`amount > 0`) or shrinks (`amount < 0`) the selection by
    /// `|amount|` pixels; `0` returns an unchanged copy
    ///
    /// Growing makes every background pixel within Euclidean distance
    /// `amount` of a foreground pixel foreground. Shrinking keeps a
    /// foreground pixel only if every background pixel is farther than
    /// `|amount|` away. Pixels beyond the image border count as neither.
    ///
    /// # Examples
    ///
    /// ```
    /// use imageops_cutout::{Mask, Morphology};
    ///
    /// let square = Mask::from_fn(20, 20, |x, y| (5..15).contains(&x) && (5..15).contains(&y));
    /// assert_eq!(square.dilate_erode(-2).foreground_count(), 36);
    /// ```
    fn dilate_erode(&self, amount: i32) -> Self;

    /// Grows the selection by `radius` pixels
    fn dilate(&self, radius: u32) -> Self;

    /// Shrinks the selection by `radius` pixels
    fn erode(&self, radius: u32) -> Self;
}

impl Morphology for Mask {
    fn dilate_erode(&self, amount: i32) -> Self {
        match amount {
            0 => self.clone(),
            amount if amount > 0 => self.dilate(amount.unsigned_abs()),
            amount => self.erode(amount.unsigned_abs()),
        }
    }

    fn dilate(&self, radius: u32) -> Self {
        if radius == 0 {
            return self.clone();
        }

        // Squared distance to the nearest foreground pixel.
        let Some(distances) = squared_distance_to_nonzero(self.as_image()) else {
            return self.clone();
        };

        let limit = squared(radius);
        let grown = map_with_distance(self.as_image(), &distances, |_, distance| {
            if distance <= limit {
                FOREGROUND
            } else {
                BACKGROUND
            }
        });
        Mask::from_image(grown)
    }

    fn erode(&self, radius: u32) -> Self {
        if radius == 0 {
            return self.clone();
        }

        // Squared distance to the nearest background pixel.
        let background = self.invert();
        let Some(distances) = squared_distance_to_nonzero(background.as_image()) else {
            return self.clone();
        };

        let limit = squared(radius);
        let shrunk = map_with_distance(self.as_image(), &distances, |value, distance| {
            if value != BACKGROUND && distance > limit {
                FOREGROUND
            } else {
                BACKGROUND
            }
        });
        Mask::from_image(shrunk)
    }
}

/// Free-function form of [`Morphology::dilate_erode`].
pub fn dilate_erode(mask: &Mask, amount: i32) -> Mask {
    mask.dilate_erode(amount)
}

#[inline]
fn squared(radius: u32) -> f64 {
    let radius = f64::from(radius);
    radius * radius
}
