//! Test utilities for imageops-cutout
//!
//! Shared fixtures for the unit tests. Only compiled when running tests.

use image::Rgba;

use crate::imageops_cutout::mask::Mask;
use crate::imageops_cutout::raster::RasterBuffer;

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Creates a `size`x`size` canvas with an opaque red square spanning
/// `start..end` on both axes and `background` everywhere else.
pub fn square_canvas(size: u32, start: u32, end: u32, background: Rgba<u8>) -> RasterBuffer {
    RasterBuffer::from_fn(size, size, |x, y| {
        if (start..end).contains(&x) && (start..end).contains(&y) {
            RED
        } else {
            background
        }
    })
}

/// Creates a mask selecting the square `start..end` on both axes.
pub fn square_mask(size: u32, start: u32, end: u32) -> Mask {
    Mask::from_fn(size, size, |x, y| {
        (start..end).contains(&x) && (start..end).contains(&y)
    })
}

/// Creates a 30x10 canvas with a red square at x 2..8 and a green square
/// at x 20..26, both spanning y 2..8, on white.
pub fn two_squares() -> RasterBuffer {
    RasterBuffer::from_fn(30, 10, |x, y| {
        if (2..8).contains(&x) && (2..8).contains(&y) {
            RED
        } else if (20..26).contains(&x) && (2..8).contains(&y) {
            Rgba([0, 255, 0, 255])
        } else {
            WHITE
        }
    })
}

/// Checks whether two pixels are equal within `tolerance` on every channel.
pub fn pixels_approx_equal(expected: Rgba<u8>, actual: Rgba<u8>, tolerance: u8) -> bool {
    expected
        .0
        .iter()
        .zip(actual.0.iter())
        .all(|(e, a)| e.abs_diff(*a) <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_fixtures_line_up() {
        let canvas = square_canvas(10, 2, 6, CLEAR);
        let mask = square_mask(10, 2, 6);

        assert_eq!(mask.foreground_count(), 16);
        for (x, y, pixel) in canvas.enumerate_pixels() {
            assert_eq!(mask.is_foreground(x, y), *pixel == RED);
        }
    }

    #[test]
    fn test_pixels_approx_equal() {
        assert!(pixels_approx_equal(RED, Rgba([253, 2, 0, 255]), 2));
        assert!(!pixels_approx_equal(RED, Rgba([250, 0, 0, 255]), 2));
    }
}
