use crate::measurement::{MeasurementSet, MAX_CONFIDENCE, MIN_CONFIDENCE};

const POSE_WEIGHT: f32 = 0.6;
const COMPLETENESS_WEIGHT: f32 = 0.4;

/// Number of geometry-derived measurements a complete run is expected to produce.
pub const EXPECTED_MEASUREMENTS: usize = 8;

/// Combines detector confidence and measurement completeness into a percentage.
///
/// The result never leaves [50, 95]: the method is always approximate, and a
/// run that got past the quality gate is never reported as worthless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self
    }

    /// `pose_confidence` is the mean landmark visibility in [0, 1].
    pub fn score(&self, pose_confidence: f32, measurements: &MeasurementSet) -> f32 {
        let completeness =
            (measurements.geometric_count() as f32 / EXPECTED_MEASUREMENTS as f32).min(1.0);
        let raw = 100.0 * (POSE_WEIGHT * pose_confidence + COMPLETENESS_WEIGHT * completeness);
        if raw.is_nan() {
            return MIN_CONFIDENCE;
        }
        raw.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}
