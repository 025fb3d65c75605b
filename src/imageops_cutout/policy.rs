use std::time::Duration;

use crate::error::Error;

/// Largest accepted `|dilation|`
pub const MAX_DILATION: u32 = 1024;
/// Largest accepted feather width
pub const MAX_FEATHER: u32 = 1024;
/// Largest accepted crop padding
pub const MAX_PADDING: u32 = 4096;

/// Post-processing settings applied when a mask is turned into a cutout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractionPolicy {
    /// Pixels to grow (positive) or shrink (negative) the selection by
    pub dilation: i32,
    /// Width of the soft edge in pixels, 0 for a hard edge
    pub feather: u32,
    /// Margin kept around the content when cropping
    pub padding: u32,
    /// Crop to the padded content box instead of keeping the source size
    pub crop: bool,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            dilation: 0,
            feather: 0,
            padding: 0,
            crop: true,
        }
    }
}

impl ExtractionPolicy {
    /// Settings for one-click automatic extraction
    ///
    /// Shrinks the selection slightly to trim the halo segmentation models
    /// tend to leave along object edges.
    pub fn automatic() -> Self {
        Self {
            dilation: -2,
            ..Self::default()
        }
    }

    /// Builds a policy from signed host values (e.g. slider positions).
    ///
    /// # Errors
    ///
    /// * `Error::InvalidPolicy` - When `feather` or `padding` is negative or
    ///   any value is out of range
    pub fn try_from_signed(
        dilation: i32,
        feather: i32,
        padding: i32,
        crop: bool,
    ) -> Result<Self, Error> {
        let feather = u32::try_from(feather).map_err(|_| {
            Error::InvalidPolicy(format!("feather must not be negative, got {feather}"))
        })?;
        let padding = u32::try_from(padding).map_err(|_| {
            Error::InvalidPolicy(format!("padding must not be negative, got {padding}"))
        })?;

        let policy = Self {
            dilation,
            feather,
            padding,
            crop,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn with_dilation(mut self, dilation: i32) -> Self {
        self.dilation = dilation;
        self
    }

    pub fn with_feather(mut self, feather: u32) -> Self {
        self.feather = feather;
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_crop(mut self, crop: bool) -> Self {
        self.crop = crop;
        self
    }

    /// Checks every setting against its accepted range.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidPolicy` - Naming the first offending setting
    pub fn validate(&self) -> Result<(), Error> {
        if self.dilation.unsigned_abs() > MAX_DILATION {
            return Err(Error::InvalidPolicy(format!(
                "dilation {} exceeds +/-{MAX_DILATION}",
                self.dilation
            )));
        }
        if self.feather > MAX_FEATHER {
            return Err(Error::InvalidPolicy(format!(
                "feather {} exceeds {MAX_FEATHER}",
                self.feather
            )));
        }
        if self.padding > MAX_PADDING {
            return Err(Error::InvalidPolicy(format!(
                "padding {} exceeds {MAX_PADDING}",
                self.padding
            )));
        }
        Ok(())
    }
}

/// How prompts are sent to the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PromptMode {
    /// Each click is one point prompt
    #[default]
    Auto,
    /// Each gesture is a stroke sent as a scribble prompt
    Scribble,
}

/// Settings for an interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    pub mode: PromptMode,
    pub policy: ExtractionPolicy,
    /// How long the classifier may take before falling back
    #[cfg_attr(feature = "serde", serde(with = "duration_millis"))]
    pub classify_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: PromptMode::Auto,
            policy: ExtractionPolicy::default(),
            classify_timeout: Duration::from_secs(10),
        }
    }
}

impl SessionConfig {
    pub fn with_mode(mut self, mode: PromptMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_policy(mut self, policy: ExtractionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = timeout;
        self
    }
}

#[cfg(feature = "serde")]
mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
