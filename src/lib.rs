//! # tailor-measure
//!
//! Approximate body measurements from a single photograph's pose landmarks.
//!
//! This crate provides:
//! - **Quality Gate**: scores landmark visibility, left/right symmetry and
//!   upright posture, rejecting poses that cannot be measured
//! - **Scale Calibration**: converts normalized landmark distances to physical
//!   units from an assumed subject height
//! - **Estimation**: chest, waist, hips, shoulders, arm length, inseam, neck,
//!   bicep, thigh and wrist from landmark geometry and anthropometric ratios
//! - **Validation**: confidence scoring, plausibility clamping and
//!   inch/centimetre conversion
//!
//! Landmarks come from an external pose detector (33-point MediaPipe Pose
//! topology, normalized coordinates with per-point visibility).
//!
//! ## Pipeline Overview
//!
//! 1. Assess pose quality; reject with [`Error::PoseUnusable`] below threshold
//! 2. Calibrate a scale factor from the head-to-foot span
//! 3. Estimate each measurement independently; unusable anchors omit it
//! 4. Score confidence from detection confidence and completeness
//! 5. Clamp every value onto its plausible range
//!
//! Internal faults never reach the caller: the pipeline returns a fixed
//! fallback set at 50% confidence instead.
//!
//! ## Quick Start
//!
//! ```rust
//! use tailor_measure::{
//!     BodyLandmark, Landmark, LandmarkSet, MeasurementKind, MeasurementPipeline, NUM_LANDMARKS,
//! };
//!
//! let mut points = vec![Landmark::new(0.5, 0.3, 0.0, 0.9); NUM_LANDMARKS];
//! let mut place = |part: BodyLandmark, x: f32, y: f32| {
//!     points[part.index()] = Landmark::new(x, y, 0.0, 0.9);
//! };
//! place(BodyLandmark::Nose, 0.5, 0.1);
//! place(BodyLandmark::LeftShoulder, 0.6, 0.25);
//! place(BodyLandmark::RightShoulder, 0.4, 0.25);
//! place(BodyLandmark::LeftHip, 0.55, 0.5);
//! place(BodyLandmark::RightHip, 0.45, 0.5);
//! place(BodyLandmark::LeftAnkle, 0.55, 0.9);
//! place(BodyLandmark::RightAnkle, 0.45, 0.9);
//! let landmarks = LandmarkSet::new(points, 1000, 2000)?;
//!
//! let measurements = MeasurementPipeline::default().measure(&landmarks)?;
//! assert!(measurements.contains(MeasurementKind::Inseam));
//! println!("{}", serde_json::to_string_pretty(&measurements)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Estimation
//!
//! Implement the [`Estimate`] trait to replace the estimation stage while
//! keeping the quality gate, calibration, scoring and validation.

mod confidence;
mod config;
mod error;
mod estimator;
mod measurement;
mod pipeline;
mod quality;
mod scale;
mod summary;
mod types;
mod validate;

pub use confidence::{ConfidenceScorer, EXPECTED_MEASUREMENTS};
pub use config::MeasurementConfig;
pub use error::{Error, Result};
pub use estimator::{Estimate, MeasurementEstimator};
pub use measurement::{
    convert_formatted, Measurement, MeasurementKind, MeasurementSet, Unit, CM_PER_INCH,
    CONFIDENCE_KEY, MAX_CONFIDENCE, MIN_CONFIDENCE,
};
pub use pipeline::{MeasurementPipeline, PipelineReport, Stage};
pub use quality::{PoseQualityAssessor, QualityReport};
pub use scale::{ScaleCalibrator, ScaleFactor, ScaleSource};
pub use summary::{MeasurementStats, MeasurementSummary, KEY_MEASUREMENTS};
pub use types::{BodyLandmark, ImageSize, Landmark, LandmarkPair, LandmarkSet, Point, NUM_LANDMARKS};
pub use validate::{Range, RangeTable, RangeValidator};
