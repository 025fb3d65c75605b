pub mod apply_alpha_mask;
pub mod classify;
pub mod crop_box;
pub mod driver;
pub mod extractor;
pub mod feather;
pub mod host;
pub mod magic_wand;
pub mod mask;
pub mod mask_algebra;
pub mod morphology;
pub mod policy;
pub mod raster;
pub mod segmenter;
pub mod session;
