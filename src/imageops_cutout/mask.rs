use image::{ImageBuffer, Luma};

use crate::error::{Error, SegmenterError};
use crate::Image;

/// Value written for foreground pixels
pub const FOREGROUND: u8 = u8::MAX;
/// Value written for background pixels
pub const BACKGROUND: u8 = 0;

/// Continuous per-pixel transparency (0 = transparent, 255 = opaque)
pub type AlphaMap = Image<Luma<u8>>;

/// Binary per-pixel classification
///
/// One convention for the whole crate: nonzero is foreground (written as
/// [`FOREGROUND`]), zero is background. The inverted convention of
/// segmentation backends lives only in [`CategoryMask`], and converting
/// between the two is explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask(Image<Luma<u8>>);

impl Mask {
    /// Creates an all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self(ImageBuffer::new(width, height))
    }

    /// Creates a mask whose foreground is given by a predicate.
    pub fn from_fn<F>(width: u32, height: u32, mut is_foreground: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        Self(ImageBuffer::from_fn(width, height, |x, y| {
            Luma([if is_foreground(x, y) {
                FOREGROUND
            } else {
                BACKGROUND
            }])
        }))
    }

    /// Creates a mask from one byte per pixel, nonzero meaning foreground.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidBuffer` - When `values.len() != width * height`
    pub fn from_raw(width: u32, height: u32, values: Vec<u8>) -> Result<Self, Error> {
        let len = values.len();
        if len as u64 != u64::from(width) * u64::from(height) {
            return Err(Error::InvalidBuffer {
                width,
                height,
                channels: 1,
                len,
            });
        }

        ImageBuffer::from_raw(width, height, values)
            .map(Self::from_image)
            .ok_or(Error::InvalidBuffer {
                width,
                height,
                channels: 1,
                len,
            })
    }

    /// Wraps a gray image, normalizing every nonzero value to [`FOREGROUND`].
    pub fn from_image(mut image: Image<Luma<u8>>) -> Self {
        image
            .iter_mut()
            .filter(|value| **value != BACKGROUND)
            .for_each(|value| *value = FOREGROUND);
        Self(image)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// Whether the pixel at `(x, y)` is foreground.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the mask, like `ImageBuffer::get_pixel`.
    #[inline]
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[0] != BACKGROUND
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.0.iter().filter(|&&value| value != BACKGROUND).count()
    }

    /// Whether the mask has no foreground pixel at all.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&value| value == BACKGROUND)
    }

    /// Swaps foreground and background.
    pub fn invert(&self) -> Self {
        let mut image = self.0.clone();
        image.iter_mut().for_each(|value| {
            *value = if *value == BACKGROUND {
                FOREGROUND
            } else {
                BACKGROUND
            }
        });
        Self(image)
    }

    /// Nearest-neighbour resample to `width` x `height`.
    ///
    /// Target pixel `x` reads source pixel `floor(x * source_width / width)`,
    /// which is the mapping used to overlay a low-resolution segmentation
    /// output on its source image.
    pub fn resize_nearest(&self, width: u32, height: u32) -> Self {
        if self.dimensions() == (width, height) {
            return self.clone();
        }

        let (source_width, source_height) = self.dimensions();
        if source_width == 0 || source_height == 0 {
            return Self::new(width, height);
        }

        let column = |x: u32| (u64::from(x) * u64::from(source_width) / u64::from(width)) as u32;
        let row = |y: u32| (u64::from(y) * u64::from(source_height) / u64::from(height)) as u32;

        Self(ImageBuffer::from_fn(width, height, |x, y| {
            *self.0.get_pixel(column(x), row(y))
        }))
    }

    /// Converts to the segmentation backend convention (`0` = foreground).
    pub fn to_category_mask(&self) -> CategoryMask {
        let (width, height) = self.dimensions();
        CategoryMask {
            width,
            height,
            values: self
                .0
                .iter()
                .map(|&value| {
                    if value == BACKGROUND {
                        CategoryMask::BACKGROUND_LABEL
                    } else {
                        CategoryMask::FOREGROUND_LABEL
                    }
                })
                .collect(),
        }
    }

    /// The mask as a gray image (foreground = 255).
    pub fn as_image(&self) -> &Image<Luma<u8>> {
        &self.0
    }

    pub fn into_image(self) -> Image<Luma<u8>> {
        self.0
    }
}

/// Category mask in the segmentation backend convention
///
/// One label per pixel, `0` is foreground and any other label is background.
/// Backends return this type; the core converts it with `Mask::from` before
/// any mask algebra happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMask {
    width: u32,
    height: u32,
    values: Vec<u8>,
}

impl CategoryMask {
    pub const FOREGROUND_LABEL: u8 = 0;
    pub const BACKGROUND_LABEL: u8 = 1;

    /// # Errors
    ///
    /// * `SegmenterError::MalformedMask` - When `values.len() != width * height`
    pub fn new(width: u32, height: u32, values: Vec<u8>) -> Result<Self, SegmenterError> {
        if values.len() as u64 != u64::from(width) * u64::from(height) {
            return Err(SegmenterError::MalformedMask {
                width,
                height,
                len: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }
}

impl From<CategoryMask> for Mask {
    fn from(category: CategoryMask) -> Self {
        let CategoryMask {
            width,
            height,
            values,
        } = category;
        let row = width as usize;
        // CategoryMask::new guarantees one label per pixel.
        Mask::from_fn(width, height, |x, y| {
            values[y as usize * row + x as usize] == CategoryMask::FOREGROUND_LABEL
        })
    }
}
