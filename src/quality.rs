//! Pose quality scoring.
//!
//! A landmark set is only worth measuring when the body is visible on both
//! sides and standing roughly upright. The assessor combines three sub-scores
//! into an overall score that gates the rest of the pipeline.

use serde::Serialize;

use crate::config::MeasurementConfig;
use crate::error::{Error, Result};
use crate::types::{BodyLandmark, LandmarkPair, LandmarkSet};

const VISIBILITY_WEIGHT: f32 = 0.4;
const SYMMETRY_WEIGHT: f32 = 0.3;
const POSTURE_WEIGHT: f32 = 0.3;

/// Vertical offset between paired points, in normalized units, at which the
/// alignment term reaches zero.
const MAX_TILT: f32 = 0.1;

/// Usability scores for one landmark set. Every score lies in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityReport {
    pub visibility_score: f32,
    pub symmetry_score: f32,
    pub posture_score: f32,
    pub overall: f32,
    /// Mean visibility across all 33 points. Feeds confidence scoring, not gating.
    pub detection_confidence: f32,
}

impl QualityReport {
    pub fn passes(&self, threshold: f32) -> bool {
        self.overall >= threshold
    }

    /// Name of the lowest sub-score, used to explain a rejection.
    pub fn weakest(&self) -> &'static str {
        let scores = [
            ("visibility", self.visibility_score),
            ("symmetry", self.symmetry_score),
            ("posture", self.posture_score),
        ];
        scores
            .iter()
            .fold(scores[0], |min, s| if s.1 < min.1 { *s } else { min })
            .0
    }
}

#[derive(Debug, Clone)]
pub struct PoseQualityAssessor {
    visibility_threshold: f32,
    quality_threshold: f32,
}

impl Default for PoseQualityAssessor {
    fn default() -> Self {
        Self::from_config(&MeasurementConfig::default())
    }
}

impl PoseQualityAssessor {
    pub fn new(visibility_threshold: f32, quality_threshold: f32) -> Self {
        Self {
            visibility_threshold,
            quality_threshold,
        }
    }

    pub fn from_config(config: &MeasurementConfig) -> Self {
        Self::new(config.visibility_threshold, config.quality_threshold)
    }

    pub fn assess(&self, landmarks: &LandmarkSet) -> QualityReport {
        let visibility_score = self.visibility_score(landmarks);
        let symmetry_score = self.symmetry_score(landmarks);
        let posture_score = posture_score(landmarks);

        let overall = (visibility_score * VISIBILITY_WEIGHT
            + symmetry_score * SYMMETRY_WEIGHT
            + posture_score * POSTURE_WEIGHT)
            .clamp(0.0, 1.0);

        QualityReport {
            visibility_score,
            symmetry_score,
            posture_score,
            overall,
            detection_confidence: landmarks.mean_visibility().clamp(0.0, 1.0),
        }
    }

    /// Reject the pose when its overall score is below the configured threshold.
    pub fn gate(&self, report: &QualityReport) -> Result<()> {
        if report.passes(self.quality_threshold) {
            return Ok(());
        }
        Err(Error::PoseUnusable {
            overall: report.overall,
            reason: format!(
                "quality below {:.2}, weakest factor is {}",
                self.quality_threshold,
                report.weakest()
            ),
        })
    }

    /// Mean visibility of the visible key body points; 0 when none are visible.
    fn visibility_score(&self, landmarks: &LandmarkSet) -> f32 {
        let (total, count) = LandmarkPair::KEY_BODY
            .iter()
            .flat_map(|pair| [pair.left, pair.right])
            .map(|part| landmarks.get(part))
            .filter(|lm| lm.is_visible(self.visibility_threshold))
            .fold((0.0f32, 0usize), |(total, count), lm| {
                (total + lm.visibility, count + 1)
            });

        if count == 0 {
            return 0.0;
        }
        (total / count as f32).clamp(0.0, 1.0)
    }

    /// Fraction of key pairs visible on the weaker side.
    fn symmetry_score(&self, landmarks: &LandmarkSet) -> f32 {
        let visible =
            |part: BodyLandmark| landmarks.get(part).is_visible(self.visibility_threshold);
        let left = LandmarkPair::KEY_BODY.iter().filter(|p| visible(p.left)).count();
        let right = LandmarkPair::KEY_BODY.iter().filter(|p| visible(p.right)).count();

        left.min(right) as f32 / LandmarkPair::KEY_BODY.len() as f32
    }
}

/// Upright-torso score from shoulder and hip alignment.
///
/// Zero when the shoulders are not above the hips (image y grows downwards).
fn posture_score(landmarks: &LandmarkSet) -> f32 {
    let vertical = |pair: LandmarkPair| {
        let left = landmarks.get(pair.left).y;
        let right = landmarks.get(pair.right).y;
        ((left + right) / 2.0, (left - right).abs())
    };
    let (shoulder_center, shoulder_tilt) = vertical(LandmarkPair::SHOULDERS);
    let (hip_center, hip_tilt) = vertical(LandmarkPair::HIPS);

    if shoulder_center >= hip_center {
        return 0.0;
    }

    let alignment = |tilt: f32| (1.0 - tilt / MAX_TILT).max(0.0);
    ((alignment(shoulder_tilt) + alignment(hip_tilt)) / 2.0).clamp(0.0, 1.0)
}
