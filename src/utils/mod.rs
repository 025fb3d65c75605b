//! Internal utility functions for imageops-cutout.
//!
//! This module contains common functionality used across different image operations.

use image::Luma;
use imageproc::definitions::Image;
use imageproc::distance_transform::euclidean_squared_distance_transform;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::error::Error;

/// Validates that two images have matching dimensions.
///
/// # Arguments
///
/// * `expected` - The dimensions the operation requires (width, height)
/// * `actual` - The dimensions that were supplied (width, height)
///
/// # Returns
///
/// `Ok(())` if the dimensions match, otherwise `Error::DimensionMismatch`
pub fn validate_matching_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, actual })
    }
}

/// Converts an image-space coordinate to the pixel that contains it.
///
/// # Arguments
///
/// * `x` - Horizontal coordinate in pixels
/// * `y` - Vertical coordinate in pixels
/// * `width` - The width of the image
/// * `height` - The height of the image
///
/// # Returns
///
/// The integer pixel position, or `Error::OutOfBounds` when the point lies
/// outside `[0, width) x [0, height)` or is not finite
pub fn pixel_at(x: f64, y: f64, width: u32, height: u32) -> Result<(u32, u32), Error> {
    let out_of_bounds = || Error::OutOfBounds {
        x: if x.is_finite() { x.floor() as i64 } else { i64::MAX },
        y: if y.is_finite() { y.floor() as i64 } else { i64::MAX },
        width,
        height,
    };

    if !x.is_finite() || !y.is_finite() {
        return Err(out_of_bounds());
    }

    let (px, py) = (x.floor(), y.floor());
    if px < 0.0 || py < 0.0 || px >= f64::from(width) || py >= f64::from(height) {
        return Err(out_of_bounds());
    }

    Ok((px as u32, py as u32))
}

/// Squared Euclidean distance from every pixel to the nearest nonzero pixel.
///
/// Returns `None` when the image has no nonzero pixel, in which case every
/// distance would be infinite.
pub fn squared_distance_to_nonzero(image: &Image<Luma<u8>>) -> Option<Image<Luma<f64>>> {
    if image.iter().all(|&value| value == 0) {
        return None;
    }
    Some(euclidean_squared_distance_transform(image))
}

/// Builds a gray image by mapping a source image and a distance field pixel by pixel.
///
/// Both inputs must share dimensions. The pass runs on rayon when the
/// `rayon` feature is enabled.
pub fn map_with_distance<F>(
    source: &Image<Luma<u8>>,
    distances: &Image<Luma<f64>>,
    f: F,
) -> Image<Luma<u8>>
where
    F: Fn(u8, f64) -> u8 + Send + Sync,
{
    let (width, height) = source.dimensions();
    debug_assert_eq!((width, height), distances.dimensions());

    let mut output: Image<Luma<u8>> = Image::new(width, height);

    #[cfg(feature = "rayon")]
    output
        .par_iter_mut()
        .zip(source.par_iter().zip(distances.par_iter()))
        .for_each(|(out, (&value, &distance))| *out = f(value, distance));

    #[cfg(not(feature = "rayon"))]
    output
        .iter_mut()
        .zip(source.iter().zip(distances.iter()))
        .for_each(|(out, (&value, &distance))| *out = f(value, distance));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::gray_image;

    #[test]
    fn test_validate_matching_dimensions() {
        assert!(validate_matching_dimensions((100, 100), (100, 100)).is_ok());
        assert_eq!(
            validate_matching_dimensions((100, 100), (50, 100)),
            Err(Error::DimensionMismatch {
                expected: (100, 100),
                actual: (50, 100)
            })
        );
    }

    #[test]
    fn test_pixel_at() {
        assert_eq!(pixel_at(0.0, 0.0, 10, 10), Ok((0, 0)));
        assert_eq!(pixel_at(9.99, 3.5, 10, 10), Ok((9, 3)));
        assert!(pixel_at(10.0, 0.0, 10, 10).is_err());
        assert!(pixel_at(-0.5, 0.0, 10, 10).is_err());
        assert!(pixel_at(f64::NAN, 0.0, 10, 10).is_err());
    }

    #[test]
    fn test_pixel_at_reports_floored_coordinates() {
        assert_eq!(
            pixel_at(-0.5, 12.7, 10, 10),
            Err(Error::OutOfBounds {
                x: -1,
                y: 12,
                width: 10,
                height: 10
            })
        );
    }

    #[test]
    fn test_squared_distance_to_nonzero() {
        let image = gray_image!(
            0, 0, 255;
            0, 0, 0);
        let distances = squared_distance_to_nonzero(&image).unwrap();
        assert_eq!(distances.get_pixel(2, 0)[0], 0.0);
        assert_eq!(distances.get_pixel(1, 0)[0], 1.0);
        assert_eq!(distances.get_pixel(0, 1)[0], 5.0);

        assert!(squared_distance_to_nonzero(&gray_image!(0, 0; 0, 0)).is_none());
    }
}
