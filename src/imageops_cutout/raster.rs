use image::{ImageBuffer, Rgba};

use crate::error::Error;
use crate::Image;

/// An RGBA pixel buffer, 4 bytes per pixel, row-major
///
/// The `image` crate keeps `len == width * height * 4` for every buffer it
/// hands out, so the invariant holds for any value of this type.
pub type RasterBuffer = Image<Rgba<u8>>;

/// Alpha below this value counts as "transparent" for colour matching
pub const TRANSPARENT_ALPHA_THRESHOLD: u8 = 10;

/// Builds a raster from raw RGBA bytes.
///
/// # Errors
///
/// * `Error::InvalidBuffer` - When `pixels.len() != width * height * 4`
///
/// # Examples
///
/// ```
/// use imageops_cutout::raster_from_rgba;
///
/// let raster = raster_from_rgba(1, 1, vec![255, 0, 0, 255]).unwrap();
/// assert_eq!(raster.get_pixel(0, 0).0, [255, 0, 0, 255]);
/// ```
pub fn raster_from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<RasterBuffer, Error> {
    let len = pixels.len();
    let expected = u64::from(width) * u64::from(height) * 4;
    let buffer = if len as u64 == expected {
        ImageBuffer::from_raw(width, height, pixels)
    } else {
        None
    };

    buffer.ok_or(Error::InvalidBuffer {
        width,
        height,
        channels: 4,
        len,
    })
}

/// Copies a rectangular region out of a raster.
///
/// The region is clamped to the raster; a region entirely outside yields
/// `Error::OutOfBounds`.
pub fn copy_region(
    raster: &RasterBuffer,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<RasterBuffer, Error> {
    let (raster_width, raster_height) = raster.dimensions();
    if x >= raster_width || y >= raster_height {
        return Err(Error::OutOfBounds {
            x: i64::from(x),
            y: i64::from(y),
            width: raster_width,
            height: raster_height,
        });
    }

    let width = width.min(raster_width - x);
    let height = height.min(raster_height - y);
    Ok(image::imageops::crop_imm(raster, x, y, width, height).to_image())
}
