//! End-to-end behaviour of the measurement pipeline on synthetic poses.

mod common;

use common::{standing, with_visibility, LOWER_BODY};
use tailor_measure::{
    BodyLandmark, Error, Estimate, LandmarkSet, MeasurementConfig, MeasurementKind,
    MeasurementPipeline, MeasurementSet, ScaleFactor, ScaleSource, Stage, Unit,
};

fn approx(actual: Option<f32>, expected: f32) -> bool {
    actual.map_or(false, |v| (v - expected).abs() < 1e-3)
}

#[test]
fn standing_pose_reports_validated_measurements() {
    let report = MeasurementPipeline::default().run(&standing()).unwrap();
    assert!(!report.fallback);

    let scale = report.scale.unwrap();
    assert_eq!(scale.source, ScaleSource::Measured);
    assert!((scale.value - 0.0425).abs() < 1e-6);

    let json = serde_json::to_value(&report.measurements).unwrap();
    assert_eq!(json["chest"], "28.0 inches");
    assert_eq!(json["waist"], "24.0 inches");
    assert_eq!(json["hips"], "30.0 inches");
    assert_eq!(json["shoulders"], "14.0 inches");
    assert_eq!(json["armLength"], "20.0 inches");
    assert_eq!(json["inseam"], "34.0 inches");
    assert_eq!(json["neck"], "12.0 inches");
    assert_eq!(json["bicep"], "8.0 inches");
    assert_eq!(json["thigh"], "16.0 inches");
    assert_eq!(json["wrist"], "6.5 inches");
    assert_eq!(json["confidence"], "95%");
}

#[test]
fn switching_only_the_unit_keeps_proportions() {
    let config = MeasurementConfig {
        base_unit: Unit::Cm,
        ..MeasurementConfig::default()
    };
    let set = MeasurementPipeline::new(config).measure(&standing()).unwrap();

    let inseam = set.get(MeasurementKind::Inseam).unwrap();
    assert_eq!(inseam.unit, Unit::Cm);
    assert!((inseam.value - 86.36).abs() < 1e-2);
    // Lower bound of 28 inches, expressed in cm.
    assert!(approx(set.value(MeasurementKind::Chest), 71.12));
}

#[test]
fn upper_body_only_passes_gate_with_strong_shoulders() {
    let pose = with_visibility(&standing(), &LOWER_BODY, 0.2);
    let report = MeasurementPipeline::default().run(&pose).unwrap();

    let quality = report.quality.unwrap();
    assert!((quality.symmetry_score - 0.25).abs() < 1e-6);
    assert!((quality.overall - 0.775).abs() < 1e-4);

    let set = &report.measurements;
    for kind in [
        MeasurementKind::ArmLength,
        MeasurementKind::Chest,
        MeasurementKind::Shoulders,
        MeasurementKind::Neck,
    ] {
        assert!(set.contains(kind), "{} missing", kind);
    }
    for kind in [
        MeasurementKind::Inseam,
        MeasurementKind::Thigh,
        MeasurementKind::Hips,
        MeasurementKind::Waist,
    ] {
        assert!(!set.contains(kind), "{} present", kind);
    }

    // Ankles unusable, so the scale comes from the image height.
    let scale = report.scale.unwrap();
    assert_eq!(scale.source, ScaleSource::MissingAnchors);
    assert!((scale.value - 68.0 / 2000.0).abs() < 1e-7);
}

#[test]
fn upper_body_only_fails_gate_with_weak_shoulders() {
    let pose = with_visibility(&standing(), &LOWER_BODY, 0.2);
    let pose = with_visibility(
        &pose,
        &[BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder],
        0.55,
    );

    let err = MeasurementPipeline::default().run(&pose).unwrap_err();
    assert!(err.to_string().contains("retake photo"));
    match err {
        Error::PoseUnusable { overall, .. } => assert!((overall - 0.595).abs() < 1e-4),
        other => panic!("expected PoseUnusable, got {:?}", other),
    }
}

#[test]
fn hidden_head_falls_back_to_image_height_scale() {
    let pose = with_visibility(&standing(), &[BodyLandmark::Nose], 0.0);
    let report = MeasurementPipeline::default().run(&pose).unwrap();

    let scale = report.scale.unwrap();
    assert_eq!(scale.source, ScaleSource::MissingAnchors);
    assert_eq!(scale.value, 68.0 / 2000.0);
    assert!(!report.fallback);
}

#[test]
fn hidden_feet_fall_back_to_image_height_scale() {
    let pose = with_visibility(
        &standing(),
        &[BodyLandmark::LeftAnkle, BodyLandmark::RightAnkle],
        0.1,
    );
    let report = MeasurementPipeline::default().run(&pose).unwrap();

    let scale = report.scale.unwrap();
    assert!(scale.is_fallback());
    assert_eq!(scale.value, 68.0 / 2000.0);
    assert!(!report.measurements.contains(MeasurementKind::Inseam));
}

#[test]
fn hidden_shoulders_drop_shoulder_derived_measurements() {
    let pose = with_visibility(
        &standing(),
        &[BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder],
        0.1,
    );
    let set = MeasurementPipeline::default().measure(&pose).unwrap();

    assert!(!set.contains(MeasurementKind::Chest));
    assert!(!set.contains(MeasurementKind::Shoulders));
    assert!(!set.contains(MeasurementKind::Bicep));
    assert!(!set.contains(MeasurementKind::Waist));
    assert!(!set.contains(MeasurementKind::ArmLength));
    assert!(set.contains(MeasurementKind::Hips));
    assert!(set.contains(MeasurementKind::Inseam));

    // 100 * (0.6 * mean visibility + 0.4 * 4/8)
    assert_eq!(set.confidence_label(), "77%");
}

struct FailingEstimator;

impl Estimate for FailingEstimator {
    fn estimate(&self, _: &LandmarkSet, _: ScaleFactor) -> tailor_measure::Result<MeasurementSet> {
        Err(Error::PipelineFault {
            stage: Stage::Estimate,
            reason: "landmark geometry degenerate".to_string(),
        })
    }
}

struct PanickingEstimator;

impl Estimate for PanickingEstimator {
    fn estimate(&self, _: &LandmarkSet, _: ScaleFactor) -> tailor_measure::Result<MeasurementSet> {
        panic!("estimator blew up");
    }
}

fn assert_fallback(set: &MeasurementSet) {
    let formatted = set.to_formatted();
    assert_eq!(formatted["confidence"], "50%");
    for kind in MeasurementKind::ALL {
        assert!(formatted.contains_key(kind.key()), "{} missing", kind);
    }
    assert_eq!(formatted["chest"], "38.0 inches");
    assert_eq!(formatted["wrist"], "6.5 inches");
}

#[test]
fn estimation_error_yields_fallback_set() {
    let pipeline =
        MeasurementPipeline::with_estimator(MeasurementConfig::default(), FailingEstimator);
    let report = pipeline.run(&standing()).unwrap();
    assert!(report.fallback);
    assert!(report.quality.is_some());
    assert!(report.scale.is_some());
    assert_fallback(&report.measurements);
}

#[test]
fn estimation_panic_yields_fallback_set() {
    let pipeline =
        MeasurementPipeline::with_estimator(MeasurementConfig::default(), PanickingEstimator);
    let report = pipeline.run(&standing()).unwrap();
    assert!(report.fallback);
    assert_fallback(&report.measurements);
}

#[test]
fn unusable_pose_is_reported_even_with_faulty_estimator() {
    let pipeline =
        MeasurementPipeline::with_estimator(MeasurementConfig::default(), PanickingEstimator);
    let pose = with_visibility(&standing(), &BodyLandmark::ALL, 0.1);
    assert!(matches!(pipeline.run(&pose), Err(Error::PoseUnusable { .. })));
}

#[test]
fn shared_pipeline_serves_concurrent_runs() {
    let pipeline = MeasurementPipeline::default();
    let full = standing();
    let partial = with_visibility(&full, &LOWER_BODY, 0.2);
    let expected_full = pipeline.measure(&full).unwrap();
    let expected_partial = pipeline.measure(&partial).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pipeline = &pipeline;
                let pose = if i % 2 == 0 { &full } else { &partial };
                s.spawn(move || (i, pipeline.measure(pose).unwrap()))
            })
            .collect();

        for handle in handles {
            let (i, set) = handle.join().unwrap();
            let expected = if i % 2 == 0 { &expected_full } else { &expected_partial };
            assert_eq!(&set, expected);
        }
    });
}

#[test]
fn config_round_trips_through_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("tailor-measure.toml");

    let mut config = MeasurementConfig::default();
    config.base_unit = Unit::Cm;
    config.reference_height = 180.0;
    config.save_to_file(&path).unwrap();

    let loaded = MeasurementConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[test]
fn missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = MeasurementConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
    assert_eq!(loaded, MeasurementConfig::default());
}

#[test]
fn landmark_json_drives_the_pipeline() {
    let json = serde_json::to_string(&standing()).unwrap();
    let parsed: LandmarkSet = serde_json::from_str(&json).unwrap();
    let set = MeasurementPipeline::default().measure(&parsed).unwrap();
    assert_eq!(set.len(), MeasurementKind::COUNT);
}
