use std::fmt;
use std::future::Future;
use std::io::Cursor;
use std::str::FromStr;
use std::time::Duration;

use image::ImageFormat;
use tracing::{debug, warn};

use crate::error::ClassifyError;
use crate::imageops_cutout::raster::RasterBuffer;

/// What kind of layer an extracted cutout becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Category {
    Character,
    /// Used whenever classification is unavailable
    #[default]
    Prop,
    Scene,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Character => "character",
            Self::Prop => "prop",
            Self::Scene => "scene",
        })
    }
}

impl FromStr for Category {
    type Err = ClassifyError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().as_str() {
            "character" => Ok(Self::Character),
            "prop" => Ok(Self::Prop),
            "scene" => Ok(Self::Scene),
            other => Err(ClassifyError::Request(format!("unknown category {other:?}"))),
        }
    }
}

/// A remote service labelling extracted content
pub trait Classifier: Send + Sync {
    /// Classifies a PNG-encoded image.
    fn classify(&self, png: &[u8]) -> impl Future<Output = Result<Category, ClassifyError>> + Send;
}

/// Encodes a raster as PNG bytes.
///
/// # Errors
///
/// * `ClassifyError::Encode` - When the PNG encoder fails
pub fn encode_png(raster: &RasterBuffer) -> Result<Vec<u8>, ClassifyError> {
    let mut bytes = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|error| ClassifyError::Encode(error.to_string()))?;
    Ok(bytes)
}

/// Classifies a finished cutout, never failing.
///
/// Any encoding error, classifier error or a response slower than `timeout`
/// yields [`Category::Prop`] so the extraction result is never held back.
pub async fn classify_or_fallback<C>(
    classifier: &C,
    raster: &RasterBuffer,
    timeout: Duration,
) -> Category
where
    C: Classifier + ?Sized,
{
    let png = match encode_png(raster) {
        Ok(png) => png,
        Err(error) => {
            warn!(%error, "classification skipped");
            return Category::default();
        }
    };

    match tokio::time::timeout(timeout, classifier.classify(&png)).await {
        Ok(Ok(category)) => {
            debug!(%category, "classified cutout");
            category
        }
        Ok(Err(error)) => {
            warn!(%error, "classification failed, using fallback");
            Category::default()
        }
        Err(_) => {
            warn!(?timeout, "classification timed out, using fallback");
            Category::default()
        }
    }
}
