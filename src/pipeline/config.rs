//! Postprocessing configuration and fixed model geometry.

use crate::labels::LabelPolicy;
use crate::suppress::OverlapMetric;
use crate::tensor::BOX_CHANNELS;
use crate::util::math::check_unit;
use crate::util::{DetPostError, DetPostResult};

/// Fixed output shape of a loaded model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelShape {
    pub num_classes: usize,
    pub num_proposals: usize,
}

impl ModelShape {
    pub fn new(num_classes: usize, num_proposals: usize) -> Self {
        Self {
            num_classes,
            num_proposals,
        }
    }

    /// Derives the shape from a `[features, proposals]` tensor shape.
    pub fn from_features(features: usize, num_proposals: usize) -> DetPostResult<Self> {
        if features <= BOX_CHANNELS {
            return Err(DetPostError::InvalidDimensions {
                features,
                proposals: num_proposals,
            });
        }
        let shape = Self::new(features - BOX_CHANNELS, num_proposals);
        shape.validate()?;
        Ok(shape)
    }

    /// Number of feature rows: four box channels plus one per class.
    ///
    /// Saturates for class counts that [`ModelShape::validate`] rejects.
    pub fn features(&self) -> usize {
        BOX_CHANNELS.saturating_add(self.num_classes)
    }

    /// Rejects empty shapes and class counts whose feature count overflows.
    pub fn validate(&self) -> DetPostResult<()> {
        if self.num_classes == 0
            || self.num_proposals == 0
            || self.num_classes.checked_add(BOX_CHANNELS).is_none()
        {
            return Err(DetPostError::InvalidDimensions {
                features: self.features(),
                proposals: self.num_proposals,
            });
        }
        Ok(())
    }
}

/// Width and height of a 2D extent in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

impl Extent {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> DetPostResult<()> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if !ok(self.width) || !ok(self.height) {
            return Err(DetPostError::InvalidInputSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Tunable postprocessing policy.
#[derive(Clone, Debug, PartialEq)]
pub struct PostprocessConfig {
    /// Minimum best-class score for a proposal to enter suppression.
    pub confidence_threshold: f32,
    /// Overlap above which a lower-priority proposal is suppressed.
    pub iou_threshold: f32,
    /// Maximum number of detections per frame.
    pub max_results: usize,
    pub overlap: OverlapMetric,
    /// Drop proposal index 0 from the results, as the overlay app did.
    pub skip_index_zero: bool,
    pub label_policy: LabelPolicy,
    /// Use the rayon kernels when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_results: 30,
            overlap: OverlapMetric::PixelInclusive,
            skip_index_zero: false,
            label_policy: LabelPolicy::Strict,
            parallel: false,
        }
    }
}

impl PostprocessConfig {
    /// Settings of the camera overlay detector, reproducing its output
    /// exactly: asymmetric overlap, index 0 dropped, wrapping labels.
    pub fn legacy_overlay() -> Self {
        Self {
            confidence_threshold: 0.2,
            iou_threshold: 0.2,
            max_results: 20,
            overlap: OverlapMetric::LegacyAsymmetric,
            skip_index_zero: true,
            label_policy: LabelPolicy::Wrap,
            parallel: false,
        }
    }

    pub fn validate(&self) -> DetPostResult<()> {
        check_unit("confidence", self.confidence_threshold)?;
        check_unit("iou", self.iou_threshold)?;
        if self.max_results == 0 {
            return Err(DetPostError::InvalidInput("max_results must be at least 1"));
        }
        Ok(())
    }
}
