use thiserror::Error;

use crate::imageops_cutout::session::SessionState;

/// Error type for the pixel pipeline
///
/// These errors are deterministic and input-validated: selecting, merging,
/// post-processing and extracting never fail for transient reasons, so none
/// of these variants is worth retrying without changing the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A coordinate falls outside the source image
    ///
    /// Coordinates are image-space pixels; fractional prompt coordinates are
    /// reported truncated towards negative infinity.
    #[error("Point ({x}, {y}) is outside the {width}x{height} image")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    /// Post-processing or cropping found no foreground pixel
    ///
    /// Typically the dilation/erosion setting erased the whole selection.
    #[error("Selection is empty, nothing to extract")]
    EmptySelection,

    /// The extraction policy is malformed
    ///
    /// Rejected before any pixel work begins.
    #[error("Invalid extraction policy: {0}")]
    InvalidPolicy(String),

    /// Two images that must line up have different dimensions
    #[error("Dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },

    /// A raw pixel buffer does not have `width * height * channels` bytes
    #[error("Buffer of {len} bytes does not match a {width}x{height}x{channels} image")]
    InvalidBuffer {
        width: u32,
        height: u32,
        channels: u32,
        len: usize,
    },
}

/// Error type for segmentation backends
///
/// Returned by [`PromptSegmenter`](crate::PromptSegmenter) implementations.
/// A backend that simply finds nothing returns `Ok(None)` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmenterError {
    /// The model failed to initialize, errored or timed out
    #[error("Segmentation backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The request was cancelled before it resolved
    #[error("Segmentation request was cancelled")]
    Cancelled,

    /// The backend produced a category mask of the wrong size
    #[error("Category mask of {len} values cannot cover {width}x{height}")]
    MalformedMask { width: u32, height: u32, len: usize },
}

/// Error type for interactive sessions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A pixel pipeline stage failed
    #[error(transparent)]
    Pipeline(#[from] Error),

    /// The segmenter found no object at the prompt
    ///
    /// Informational; the session stays interactable.
    #[error("No object detected at the selected point")]
    NoObjectDetected,

    /// The segmenter failed; accumulated points are kept for a retry
    #[error("Segmentation backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The session already reached a terminal state
    #[error("Session is closed ({0:?})")]
    SessionClosed(SessionState),

    /// A gesture carried no point
    #[error("Gesture has no points")]
    EmptyGesture,

    /// `retry` was called without a previously failed gesture
    #[error("There is no gesture to retry")]
    NothingToRetry,
}

impl From<SegmenterError> for SessionError {
    fn from(error: SegmenterError) -> Self {
        match error {
            SegmenterError::BackendUnavailable(reason) => Self::BackendUnavailable(reason),
            SegmenterError::Cancelled => {
                Self::BackendUnavailable("request cancelled".to_owned())
            }
            other @ SegmenterError::MalformedMask { .. } => {
                Self::BackendUnavailable(other.to_string())
            }
        }
    }
}

/// Error type for the classification collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// The remote classifier failed or returned garbage
    #[error("Classification request failed: {0}")]
    Request(String),

    /// The extracted raster could not be encoded for upload
    #[error("Failed to encode image for classification: {0}")]
    Encode(String),
}
