//! The end-to-end measurement pipeline.
//!
//! ```text
//! quality check --fail--> PoseUnusable
//!       |
//!       v
//!   calibrate -> estimate -> score confidence -> validate -> done
//! ```
//!
//! Any fault past the quality gate, including a panic in one of the stages,
//! yields the fixed fallback set at 50% confidence instead of an error.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::confidence::ConfidenceScorer;
use crate::config::MeasurementConfig;
use crate::error::{Error, Result};
use crate::estimator::{Estimate, MeasurementEstimator};
use crate::measurement::{Measurement, MeasurementKind, MeasurementSet, Unit, MIN_CONFIDENCE};
use crate::quality::{PoseQualityAssessor, QualityReport};
use crate::scale::{ScaleCalibrator, ScaleFactor};
use crate::types::LandmarkSet;
use crate::validate::RangeValidator;

/// Stand-in values (inches) reported when the pipeline faults.
const FALLBACK_INCHES: [(MeasurementKind, f32); MeasurementKind::COUNT] = [
    (MeasurementKind::Chest, 38.0),
    (MeasurementKind::Waist, 32.0),
    (MeasurementKind::Hips, 40.0),
    (MeasurementKind::Shoulders, 18.0),
    (MeasurementKind::ArmLength, 25.0),
    (MeasurementKind::Inseam, 30.0),
    (MeasurementKind::Neck, 15.0),
    (MeasurementKind::Bicep, 12.0),
    (MeasurementKind::Thigh, 22.0),
    (MeasurementKind::Wrist, 6.5),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Init,
    QualityCheck,
    Calibrate,
    Estimate,
    ScoreConfidence,
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::QualityCheck => "quality check",
            Stage::Calibrate => "calibration",
            Stage::Estimate => "estimation",
            Stage::ScoreConfidence => "confidence scoring",
            Stage::Validate => "validation",
        };
        f.write_str(name)
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub measurements: MeasurementSet,
    pub quality: Option<QualityReport>,
    /// Absent when the run fell back before calibration finished.
    pub scale: Option<ScaleFactor>,
    /// Whether `measurements` is the fixed fallback set.
    pub fallback: bool,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(
    d: &Duration,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

/// Intermediate state, kept outside the unwind boundary so a fault can report
/// how far the run got.
#[derive(Debug, Default)]
struct Progress {
    stage: Stage,
    quality: Option<QualityReport>,
    scale: Option<ScaleFactor>,
}

impl Progress {
    fn enter(&mut self, stage: Stage) {
        log::debug!("Entering {}", stage);
        self.stage = stage;
    }
}

/// Landmarks in, measurements out.
///
/// A pipeline holds only configuration, so one instance can serve concurrent
/// runs from many threads.
#[derive(Debug, Clone)]
pub struct MeasurementPipeline<E = MeasurementEstimator> {
    config: MeasurementConfig,
    assessor: PoseQualityAssessor,
    calibrator: ScaleCalibrator,
    estimator: E,
    scorer: ConfidenceScorer,
    validator: RangeValidator,
}

impl Default for MeasurementPipeline {
    fn default() -> Self {
        Self::new(MeasurementConfig::default())
    }
}

impl MeasurementPipeline {
    pub fn new(config: MeasurementConfig) -> Self {
        let estimator = MeasurementEstimator::from_config(&config);
        Self::with_estimator(config, estimator)
    }
}

impl<E: Estimate> MeasurementPipeline<E> {
    /// Build a pipeline around a custom estimation stage.
    pub fn with_estimator(config: MeasurementConfig, estimator: E) -> Self {
        Self {
            assessor: PoseQualityAssessor::from_config(&config),
            calibrator: ScaleCalibrator::from_config(&config),
            estimator,
            scorer: ConfidenceScorer::new(),
            validator: RangeValidator::new(config.bounds.clone()),
            config,
        }
    }

    pub fn config(&self) -> &MeasurementConfig {
        &self.config
    }

    /// Measure one landmark set.
    ///
    /// The only error is [`Error::PoseUnusable`]; every other failure degrades
    /// to the fallback set.
    pub fn run(&self, landmarks: &LandmarkSet) -> Result<PipelineReport> {
        let started = Instant::now();
        let mut progress = Progress::default();

        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.execute(landmarks, &mut progress)));

        let fault = match outcome {
            Ok(Ok(measurements)) => {
                return Ok(PipelineReport {
                    measurements,
                    quality: progress.quality,
                    scale: progress.scale,
                    fallback: false,
                    elapsed: started.elapsed(),
                });
            }
            Ok(Err(e @ Error::PoseUnusable { .. })) => {
                log::warn!("{}", e);
                return Err(e);
            }
            Ok(Err(Error::PipelineFault { stage, reason })) => Error::fault(stage, reason),
            Ok(Err(other)) => Error::fault(progress.stage, other.to_string()),
            Err(payload) => Error::fault(progress.stage, panic_message(payload.as_ref())),
        };

        log::error!("{}; returning fallback measurements", fault);
        Ok(PipelineReport {
            measurements: self.fallback_measurements(),
            quality: progress.quality,
            scale: progress.scale,
            fallback: true,
            elapsed: started.elapsed(),
        })
    }

    /// Convenience wrapper returning only the measurements.
    pub fn measure(&self, landmarks: &LandmarkSet) -> Result<MeasurementSet> {
        self.run(landmarks).map(|report| report.measurements)
    }

    /// The fixed stand-in set, in the configured base unit, at 50% confidence.
    pub fn fallback_measurements(&self) -> MeasurementSet {
        let mut set = MeasurementSet::new();
        for (kind, inches) in FALLBACK_INCHES {
            let m = Measurement::new(inches, Unit::Inches).to_unit(self.config.base_unit);
            set.insert(kind, m);
        }
        set.set_confidence(MIN_CONFIDENCE);
        set
    }

    fn execute(&self, landmarks: &LandmarkSet, progress: &mut Progress) -> Result<MeasurementSet> {
        progress.enter(Stage::QualityCheck);
        let quality = self.assessor.assess(landmarks);
        progress.quality = Some(quality);
        self.assessor.gate(&quality)?;
        log::info!(
            "Pose accepted: quality {:.2} (visibility {:.2}, symmetry {:.2}, posture {:.2})",
            quality.overall,
            quality.visibility_score,
            quality.symmetry_score,
            quality.posture_score
        );

        progress.enter(Stage::Calibrate);
        let scale = self.calibrator.calibrate(landmarks);
        if !(scale.value.is_finite() && scale.value > 0.0) {
            return Err(Error::fault(Stage::Calibrate, format!("scale factor {}", scale.value)));
        }
        progress.scale = Some(scale);

        progress.enter(Stage::Estimate);
        let mut measurements = self.estimator.estimate(landmarks, scale)?;

        progress.enter(Stage::ScoreConfidence);
        let confidence = self.scorer.score(quality.detection_confidence, &measurements);
        measurements.set_confidence(confidence);

        progress.enter(Stage::Validate);
        let validated = self.validator.validate(&measurements);

        log::info!(
            "Measured {} values with {} confidence",
            validated.len(),
            validated.confidence_label()
        );
        Ok(validated)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{fixtures, BodyLandmark};

    #[test]
    fn standing_pose_end_to_end() {
        let report = MeasurementPipeline::default().run(&fixtures::standing()).unwrap();
        assert!(!report.fallback);
        assert!(report.scale.is_some());

        let set = &report.measurements;
        assert_eq!(set.len(), MeasurementKind::COUNT);
        assert_eq!(set.value(MeasurementKind::Chest), Some(28.0));
        assert_eq!(set.value(MeasurementKind::Hips), Some(30.0));
        assert_eq!(set.value(MeasurementKind::Waist), Some(24.0));
        assert!((set.value(MeasurementKind::Inseam).unwrap() - 34.0).abs() < 1e-3);
        assert_eq!(set.confidence(), 95.0);
    }

    #[test]
    fn rejects_unusable_pose() {
        let set = fixtures::with_visibility(&fixtures::standing(), &BodyLandmark::ALL, 0.2);
        let err = MeasurementPipeline::default().run(&set).unwrap_err();
        assert!(matches!(err, Error::PoseUnusable { .. }));
    }

    #[test]
    fn fallback_uses_base_unit() {
        let mut config = MeasurementConfig::default();
        config.base_unit = Unit::Cm;
        let fallback = MeasurementPipeline::new(config).fallback_measurements();
        assert_eq!(fallback.len(), MeasurementKind::COUNT);
        assert!((fallback.value(MeasurementKind::Chest).unwrap() - 96.52).abs() < 1e-3);
        assert_eq!(fallback.confidence_label(), "50%");
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Estimate.to_string(), "estimation");
        let err = Error::fault(Stage::Validate, "boom");
        assert_eq!(err.to_string(), "Pipeline fault during validation: boom");
    }
}
