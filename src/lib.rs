mod error;
mod imageops_cutout;
mod utils;

#[cfg(test)]
mod test_utils;

use image::{ImageBuffer, Pixel};

pub use error::{ClassifyError, Error, SegmenterError, SessionError};
pub use imageops_cutout::apply_alpha_mask::IntersectAlpha;
pub use imageops_cutout::classify::{classify_or_fallback, encode_png, Category, Classifier};
pub use imageops_cutout::crop_box::{compute_crop_box, CropBox, Rect};
pub use imageops_cutout::driver::{
    drive_classified_session, drive_session, session_channel, SessionEvent, SessionHandle,
    SessionOutcome,
};
pub use imageops_cutout::extractor::{extract, extract_with_origin, post_process, Extraction};
pub use imageops_cutout::feather::{feather, Feather};
pub use imageops_cutout::host::{render_overlay, EditorHost, Notice, Viewport, DEFAULT_OVERLAY};
pub use imageops_cutout::magic_wand::{select, MagicWand, SelectionStats};
pub use imageops_cutout::mask::{AlphaMap, CategoryMask, Mask, BACKGROUND, FOREGROUND};
pub use imageops_cutout::mask_algebra::{merge, merge_all, MergeOp};
pub use imageops_cutout::morphology::{dilate_erode, Morphology};
pub use imageops_cutout::policy::{
    ExtractionPolicy, PromptMode, SessionConfig, MAX_DILATION, MAX_FEATHER, MAX_PADDING,
};
pub use imageops_cutout::raster::{
    copy_region, raster_from_rgba, RasterBuffer, TRANSPARENT_ALPHA_THRESHOLD,
};
pub use imageops_cutout::segmenter::{
    FloodFillSegmenter, PointLabel, PromptPoint, PromptSegmenter, SegmentResult,
};
pub use imageops_cutout::session::{
    Gesture, GestureOutcome, Intent, InteractiveSession, Prompt, PromptTicket, SessionState,
};

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;
