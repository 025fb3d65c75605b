use image::{GenericImageView, Luma, Rgba};
use imageproc::map::map_colors2;

use crate::error::Error;
use crate::imageops_cutout::mask::AlphaMap;
use crate::imageops_cutout::raster::RasterBuffer;
use crate::utils::validate_matching_dimensions;

/// Trait for cutting an RGBA image with an alpha map
///
/// Unlike replacing the alpha channel, intersecting never makes a pixel more
/// opaque than it already is, so transparency present in the source survives
/// the cut.
pub trait IntersectAlpha {
    /// Returns a copy whose alpha is `min(source alpha, mask alpha)` per
    /// pixel, colour channels unchanged
    ///
    /// # Arguments
    ///
    /// * `mask` - The alpha map to cut with (same dimensions)
    ///
    /// # Errors
    ///
    /// * `Error::DimensionMismatch` - When image and mask dimensions don't match
    ///
    /// # Examples
    ///
    /// ```
    /// use imageops_cutout::{IntersectAlpha, RasterBuffer};
    /// use image::{GrayImage, Luma, Rgba};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let image = RasterBuffer::from_pixel(2, 1, Rgba([10, 20, 30, 100]));
    /// let mask = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 255 } else { 40 }]));
    ///
    /// let cut = image.intersect_alpha(&mask)?;
    /// assert_eq!(cut.get_pixel(0, 0), &Rgba([10, 20, 30, 100]));
    /// assert_eq!(cut.get_pixel(1, 0), &Rgba([10, 20, 30, 40]));
    /// # Ok(())
    /// # }
    /// ```
    fn intersect_alpha(&self, mask: &AlphaMap) -> Result<RasterBuffer, Error>;

    /// Same as [`IntersectAlpha::intersect_alpha`], in place
    fn intersect_alpha_mut(&mut self, mask: &AlphaMap) -> Result<&mut Self, Error>;
}

impl IntersectAlpha for RasterBuffer {
    fn intersect_alpha(&self, mask: &AlphaMap) -> Result<RasterBuffer, Error> {
        validate_dimensions(self, mask)?;

        let result = map_colors2(self, mask, |Rgba([red, green, blue, alpha]), Luma([cut])| {
            Rgba([red, green, blue, alpha.min(cut)])
        });

        Ok(result)
    }

    fn intersect_alpha_mut(&mut self, mask: &AlphaMap) -> Result<&mut Self, Error> {
        validate_dimensions(self, mask)?;

        self.pixels_mut()
            .zip(mask.pixels())
            .for_each(|(pixel, Luma([cut]))| {
                pixel[3] = pixel[3].min(*cut);
            });

        Ok(self)
    }
}

#[inline]
fn validate_dimensions<I1, I2>(image: &I1, mask: &I2) -> Result<(), Error>
where
    I1: GenericImageView,
    I2: GenericImageView,
{
    validate_matching_dimensions(image.dimensions(), mask.dimensions())
}
