//! Pixel-to-physical scale calibration from an assumed subject height.

use serde::Serialize;

use crate::config::MeasurementConfig;
use crate::measurement::Unit;
use crate::types::{BodyLandmark, LandmarkPair, LandmarkSet};
use crate::validate::Range;

/// Why the calibrator ended up with the scale it reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleSource {
    /// Derived from the head-to-foot span of the subject.
    Measured,
    /// Head or both feet unusable.
    MissingAnchors,
    /// Head-to-foot span too small relative to the image.
    SubjectTooSmall,
    /// Measured scale outside the accepted range.
    OutOfRange,
}

/// Physical units per pixel of subject height.
///
/// Multiplying a normalized distance by the scale and by the relevant image
/// dimension yields a length in the configured base unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleFactor {
    pub value: f32,
    pub source: ScaleSource,
}

impl ScaleFactor {
    pub fn is_fallback(&self) -> bool {
        self.source != ScaleSource::Measured
    }
}

#[derive(Debug, Clone)]
pub struct ScaleCalibrator {
    reference_height: f32,
    visibility_threshold: f32,
    min_person_fraction: f32,
    accepted: Range,
}

impl Default for ScaleCalibrator {
    fn default() -> Self {
        Self::from_config(&MeasurementConfig::default())
    }
}

impl ScaleCalibrator {
    pub fn from_config(config: &MeasurementConfig) -> Self {
        Self {
            reference_height: Unit::Inches.convert(config.reference_height, config.base_unit),
            visibility_threshold: config.visibility_threshold,
            min_person_fraction: config.min_person_fraction,
            accepted: config.scale_range.to_unit(Unit::Inches, config.base_unit),
        }
    }

    /// Scale assuming the subject spans the full image height.
    pub fn fallback_scale(&self, image_height: u32) -> f32 {
        self.reference_height / image_height as f32
    }

    pub fn calibrate(&self, landmarks: &LandmarkSet) -> ScaleFactor {
        let height = landmarks.height();
        let fallback = |source: ScaleSource| {
            let value = self.fallback_scale(height);
            log::warn!("Using image-height scale {:.4} ({:?})", value, source);
            ScaleFactor { value, source }
        };

        let Some(head) = landmarks.usable(BodyLandmark::Nose, self.visibility_threshold) else {
            return fallback(ScaleSource::MissingAnchors);
        };
        let Some(foot_y) = self.foot_y(landmarks) else {
            return fallback(ScaleSource::MissingAnchors);
        };

        let person_height = (foot_y - head.y).abs() * height as f32;
        if person_height < height as f32 * self.min_person_fraction {
            return fallback(ScaleSource::SubjectTooSmall);
        }

        let value = self.reference_height / person_height;
        if !self.accepted.contains(value) {
            return fallback(ScaleSource::OutOfRange);
        }

        log::debug!("Measured scale {:.4} from {:.0}px subject height", value, person_height);
        ScaleFactor {
            value,
            source: ScaleSource::Measured,
        }
    }

    /// Vertical foot position: mean of both ankles, or whichever one is usable.
    fn foot_y(&self, landmarks: &LandmarkSet) -> Option<f32> {
        let left = landmarks.usable(LandmarkPair::ANKLES.left, self.visibility_threshold);
        let right = landmarks.usable(LandmarkPair::ANKLES.right, self.visibility_threshold);
        match (left, right) {
            (Some(l), Some(r)) => Some((l.y + r.y) / 2.0),
            (Some(one), None) | (None, Some(one)) => Some(one.y),
            (None, None) => None,
        }
    }
}
