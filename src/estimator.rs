//! Body measurement estimation from landmark geometry.
//!
//! Each measurement is derived from a pair of anchor landmarks (or from other
//! measurements) and an anthropometric ratio:
//!
//! | Measurement | Basis | Formula |
//! |---|---|---|
//! | shoulders | shoulder span | width |
//! | chest | shoulder span | width × 1.8 |
//! | bicep | shoulder span | width × 0.4 |
//! | hips | hip span | width × 2.1 |
//! | thigh | hip span | width × 0.6 |
//! | waist | chest, hips | (chest + hips) / 2 × 0.85 |
//! | armLength | shoulder to wrist, both sides | mean length |
//! | inseam | hip to ankle, both sides | mean length |
//! | neck | ear span | width × 0.8 |
//! | wrist | left wrist visible | fixed constant |
//!
//! The ratios are uncalibrated empirical constants. A measurement whose
//! anchors are unusable is left out of the result rather than failing the run.

use crate::config::MeasurementConfig;
use crate::error::{Error, Result};
use crate::measurement::{Measurement, MeasurementKind, MeasurementSet, Unit};
use crate::pipeline::Stage;
use crate::scale::ScaleFactor;
use crate::types::{BodyLandmark, LandmarkPair, LandmarkSet};

const CHEST_PER_SHOULDER_WIDTH: f32 = 1.8;
const BICEP_PER_SHOULDER_WIDTH: f32 = 0.4;
const HIPS_PER_HIP_WIDTH: f32 = 2.1;
const THIGH_PER_HIP_WIDTH: f32 = 0.6;
const WAIST_PER_CHEST_HIP_MEAN: f32 = 0.85;
const NECK_PER_HEAD_WIDTH: f32 = 0.8;

/// Produces raw (unvalidated) measurements from a landmark set.
///
/// The pipeline calls this once per run; implementations must report internal
/// failures as errors rather than returning nonsense values.
pub trait Estimate {
    fn estimate(&self, landmarks: &LandmarkSet, scale: ScaleFactor) -> Result<MeasurementSet>;
}

/// Image axis a normalized distance is scaled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    fn pixels(self, landmarks: &LandmarkSet) -> f32 {
        match self {
            Axis::Horizontal => landmarks.width() as f32,
            Axis::Vertical => landmarks.height() as f32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MeasurementEstimator {
    visibility_threshold: f32,
    unit: Unit,
    /// Wrist constant, already in `unit`.
    wrist: f32,
}

impl Default for MeasurementEstimator {
    fn default() -> Self {
        Self::from_config(&MeasurementConfig::default())
    }
}

impl MeasurementEstimator {
    pub fn from_config(config: &MeasurementConfig) -> Self {
        Self {
            visibility_threshold: config.visibility_threshold,
            unit: config.base_unit,
            wrist: Unit::Inches.convert(config.wrist_estimate, config.base_unit),
        }
    }

    /// Physical distance between two usable landmarks.
    fn distance(
        &self,
        landmarks: &LandmarkSet,
        from: BodyLandmark,
        to: BodyLandmark,
        axis: Axis,
        scale: ScaleFactor,
    ) -> Option<f32> {
        let a = landmarks.usable(from, self.visibility_threshold)?;
        let b = landmarks.usable(to, self.visibility_threshold)?;
        Some(a.point().distance(&b.point()) * scale.value * axis.pixels(landmarks))
    }

    /// Horizontal span across a bilateral pair.
    fn span(&self, landmarks: &LandmarkSet, pair: LandmarkPair, scale: ScaleFactor) -> Option<f32> {
        self.distance(landmarks, pair.left, pair.right, Axis::Horizontal, scale)
    }

    /// Mean left/right length between two pairs; one side alone if only one is usable.
    fn limb(
        &self,
        landmarks: &LandmarkSet,
        from: LandmarkPair,
        to: LandmarkPair,
        axis: Axis,
        scale: ScaleFactor,
    ) -> Option<f32> {
        let sides = [
            self.distance(landmarks, from.left, to.left, axis, scale),
            self.distance(landmarks, from.right, to.right, axis, scale),
        ];
        let lengths: Vec<f32> = sides.into_iter().flatten().collect();
        if lengths.is_empty() {
            return None;
        }
        Some(lengths.iter().sum::<f32>() / lengths.len() as f32)
    }
}

impl Estimate for MeasurementEstimator {
    fn estimate(&self, landmarks: &LandmarkSet, scale: ScaleFactor) -> Result<MeasurementSet> {
        let mut set = MeasurementSet::new();
        let mut put = |kind: MeasurementKind, value: f32| -> Result<()> {
            if !value.is_finite() {
                return Err(Error::fault(
                    Stage::Estimate,
                    format!("{} evaluated to {}", kind, value),
                ));
            }
            set.insert(kind, Measurement::new(value, self.unit));
            Ok(())
        };

        let shoulder_width = self.span(landmarks, LandmarkPair::SHOULDERS, scale);
        let hip_width = self.span(landmarks, LandmarkPair::HIPS, scale);

        let chest = shoulder_width.map(|w| w * CHEST_PER_SHOULDER_WIDTH);
        let hips = hip_width.map(|w| w * HIPS_PER_HIP_WIDTH);

        if let Some(width) = shoulder_width {
            put(MeasurementKind::Shoulders, width)?;
            put(MeasurementKind::Bicep, width * BICEP_PER_SHOULDER_WIDTH)?;
        }
        if let Some(chest) = chest {
            put(MeasurementKind::Chest, chest)?;
        }
        if let Some(width) = hip_width {
            put(MeasurementKind::Thigh, width * THIGH_PER_HIP_WIDTH)?;
        }
        if let Some(hips) = hips {
            put(MeasurementKind::Hips, hips)?;
        }
        if let (Some(chest), Some(hips)) = (chest, hips) {
            put(MeasurementKind::Waist, (chest + hips) / 2.0 * WAIST_PER_CHEST_HIP_MEAN)?;
        }

        let arm = self.limb(
            landmarks,
            LandmarkPair::SHOULDERS,
            LandmarkPair::WRISTS,
            Axis::Horizontal,
            scale,
        );
        if let Some(arm) = arm {
            put(MeasurementKind::ArmLength, arm)?;
        }

        let inseam = self.limb(
            landmarks,
            LandmarkPair::HIPS,
            LandmarkPair::ANKLES,
            Axis::Vertical,
            scale,
        );
        if let Some(inseam) = inseam {
            put(MeasurementKind::Inseam, inseam)?;
        }

        if let Some(head_width) = self.span(landmarks, LandmarkPair::EARS, scale) {
            put(MeasurementKind::Neck, head_width * NECK_PER_HEAD_WIDTH)?;
        }

        if landmarks
            .usable(LandmarkPair::WRISTS.left, self.visibility_threshold)
            .is_some()
        {
            put(MeasurementKind::Wrist, self.wrist)?;
        }

        log::debug!("Estimated {} of {} measurements", set.len(), MeasurementKind::COUNT);
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{ScaleCalibrator, ScaleSource};
    use crate::types::fixtures;

    fn measured(value: f32) -> ScaleFactor {
        ScaleFactor {
            value,
            source: ScaleSource::Measured,
        }
    }

    fn approx(set: &MeasurementSet, kind: MeasurementKind, expected: f32) {
        let value = set.value(kind).unwrap_or_else(|| panic!("{} missing", kind));
        assert!(
            (value - expected).abs() < 1e-3,
            "{}: expected {}, got {}",
            kind,
            expected,
            value
        );
    }

    #[test]
    fn standing_pose_raw_values() {
        let set = fixtures::standing();
        let scale = ScaleCalibrator::default().calibrate(&set);
        let raw = MeasurementEstimator::default().estimate(&set, scale).unwrap();

        approx(&raw, MeasurementKind::Shoulders, 8.5);
        approx(&raw, MeasurementKind::Chest, 15.3);
        approx(&raw, MeasurementKind::Bicep, 3.4);
        approx(&raw, MeasurementKind::Hips, 8.925);
        approx(&raw, MeasurementKind::Thigh, 2.55);
        approx(&raw, MeasurementKind::Waist, (15.3 + 8.925) / 2.0 * 0.85);
        approx(&raw, MeasurementKind::Inseam, 34.0);
        approx(&raw, MeasurementKind::Neck, 0.06 * 42.5 * 0.8);
        approx(&raw, MeasurementKind::Wrist, 6.5);
        approx(&raw, MeasurementKind::ArmLength, 0.0674f32.sqrt() * 42.5);
        assert_eq!(raw.len(), MeasurementKind::COUNT);
    }

    #[test]
    fn hidden_shoulders_drop_dependent_measurements() {
        let set = fixtures::with_visibility(
            &fixtures::standing(),
            &[BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder],
            0.3,
        );
        let raw = MeasurementEstimator::default().estimate(&set, measured(0.0425)).unwrap();

        for kind in [
            MeasurementKind::Shoulders,
            MeasurementKind::Chest,
            MeasurementKind::Bicep,
            MeasurementKind::Waist,
            MeasurementKind::ArmLength,
        ] {
            assert!(!raw.contains(kind), "{} should be absent", kind);
        }
        assert!(raw.contains(MeasurementKind::Hips));
        assert!(raw.contains(MeasurementKind::Inseam));
    }

    #[test]
    fn one_sided_limb_uses_that_side() {
        let base = fixtures::standing();
        let set = fixtures::with_visibility(&base, &[BodyLandmark::RightAnkle], 0.1);
        let set = fixtures::with_position(&set, BodyLandmark::LeftAnkle, 0.55, 0.8);
        let raw = MeasurementEstimator::default().estimate(&set, measured(0.0425)).unwrap();
        // left hip (0.55, 0.5) to left ankle (0.55, 0.8), vertical axis
        approx(&raw, MeasurementKind::Inseam, 0.3 * 0.0425 * 2000.0);
    }

    #[test]
    fn wrist_follows_the_left_wrist() {
        let set = fixtures::with_visibility(
            &fixtures::standing(),
            &[BodyLandmark::LeftWrist, BodyLandmark::RightWrist],
            0.1,
        );
        let raw = MeasurementEstimator::default().estimate(&set, measured(0.0425)).unwrap();
        assert!(!raw.contains(MeasurementKind::Wrist));
        assert!(!raw.contains(MeasurementKind::ArmLength));

        let right_only = fixtures::with_visibility(&set, &[BodyLandmark::RightWrist], 0.9);
        let raw = MeasurementEstimator::default()
            .estimate(&right_only, measured(0.0425))
            .unwrap();
        assert!(!raw.contains(MeasurementKind::Wrist));
        assert!(raw.contains(MeasurementKind::ArmLength));

        let left_only = fixtures::with_visibility(&set, &[BodyLandmark::LeftWrist], 0.9);
        let raw = MeasurementEstimator::default()
            .estimate(&left_only, measured(0.0425))
            .unwrap();
        approx(&raw, MeasurementKind::Wrist, 6.5);
    }

    #[test]
    fn centimetre_base_unit() {
        let mut config = MeasurementConfig::default();
        config.base_unit = Unit::Cm;
        let raw = MeasurementEstimator::from_config(&config)
            .estimate(&fixtures::standing(), measured(0.0425))
            .unwrap();
        assert_eq!(raw.get(MeasurementKind::Shoulders).unwrap().unit, Unit::Cm);
        approx(&raw, MeasurementKind::Wrist, 6.5 * 2.54);
    }

    #[test]
    fn non_finite_scale_is_a_fault() {
        let err = MeasurementEstimator::default()
            .estimate(&fixtures::standing(), measured(f32::INFINITY))
            .unwrap_err();
        assert!(matches!(err, Error::PipelineFault { stage: Stage::Estimate, .. }));
    }
}
