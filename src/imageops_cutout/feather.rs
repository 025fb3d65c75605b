use crate::imageops_cutout::mask::{AlphaMap, Mask, BACKGROUND};
use crate::utils::{map_with_distance, squared_distance_to_nonzero};

/// Trait turning a hard mask into a soft alpha map
pub trait Feather {
    /// Softens the mask edge over `width` pixels
    ///
    /// The ramp runs inward from the boundary, so the feathered area never
    /// leaks past the selection: background pixels stay at alpha 0, and a
    /// foreground pixel at Euclidean distance `d` from the nearest background
    /// pixel gets `255 * min(1, d / (width + 1))`. A `width` of 0 gives a
    /// binary map.
    ///
    /// # Examples
    ///
    /// ```
    /// use imageops_cutout::{Feather, Mask};
    ///
    /// let half = Mask::from_fn(10, 1, |x, _| x < 5);
    /// let alpha = half.feather(1);
    /// assert_eq!(alpha.get_pixel(0, 0)[0], 255);
    /// assert_eq!(alpha.get_pixel(4, 0)[0], 128);
    /// assert_eq!(alpha.get_pixel(5, 0)[0], 0);
    /// ```
    fn feather(&self, width: u32) -> AlphaMap;
}

impl Feather for Mask {
    fn feather(&self, width: u32) -> AlphaMap {
        let image = self.as_image();
        if width == 0 {
            return image.clone();
        }

        // Squared distance to the nearest background pixel; none means the
        // whole mask is foreground and fully opaque.
        let Some(distances) = squared_distance_to_nonzero(self.invert().as_image()) else {
            return image.clone();
        };

        let ramp = f64::from(width) + 1.0;
        map_with_distance(image, &distances, |value, distance| {
            if value == BACKGROUND {
                return 0;
            }
            let coverage = (distance.sqrt() / ramp).min(1.0);
            (coverage * 255.0).round() as u8
        })
    }
}

/// Free-function form of [`Feather::feather`].
pub fn feather(mask: &Mask, width: u32) -> AlphaMap {
    mask.feather(width)
}
