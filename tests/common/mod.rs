//! Synthetic poses shared by the integration tests.

#![allow(dead_code)]

use tailor_measure::{BodyLandmark, Landmark, LandmarkSet, NUM_LANDMARKS};

pub const LOWER_BODY: [BodyLandmark; 6] = [
    BodyLandmark::LeftHip,
    BodyLandmark::RightHip,
    BodyLandmark::LeftKnee,
    BodyLandmark::RightKnee,
    BodyLandmark::LeftAnkle,
    BodyLandmark::RightAnkle,
];

/// Upright, symmetric, fully visible subject in a 1000x2000 image.
pub fn standing() -> LandmarkSet {
    let mut points = vec![Landmark::new(0.5, 0.3, 0.0, 1.0); NUM_LANDMARKS];
    let mut place = |part: BodyLandmark, x: f32, y: f32| {
        points[part.index()] = Landmark::new(x, y, 0.0, 1.0);
    };
    place(BodyLandmark::Nose, 0.5, 0.1);
    place(BodyLandmark::LeftEar, 0.53, 0.09);
    place(BodyLandmark::RightEar, 0.47, 0.09);
    place(BodyLandmark::LeftShoulder, 0.6, 0.25);
    place(BodyLandmark::RightShoulder, 0.4, 0.25);
    place(BodyLandmark::LeftElbow, 0.65, 0.4);
    place(BodyLandmark::RightElbow, 0.35, 0.4);
    place(BodyLandmark::LeftWrist, 0.67, 0.5);
    place(BodyLandmark::RightWrist, 0.33, 0.5);
    place(BodyLandmark::LeftHip, 0.55, 0.5);
    place(BodyLandmark::RightHip, 0.45, 0.5);
    place(BodyLandmark::LeftKnee, 0.55, 0.7);
    place(BodyLandmark::RightKnee, 0.45, 0.7);
    place(BodyLandmark::LeftAnkle, 0.55, 0.9);
    place(BodyLandmark::RightAnkle, 0.45, 0.9);
    LandmarkSet::new(points, 1000, 2000).unwrap()
}

pub fn with_visibility(base: &LandmarkSet, parts: &[BodyLandmark], visibility: f32) -> LandmarkSet {
    let mut points = base.landmarks().to_vec();
    for part in parts {
        points[part.index()].visibility = visibility;
    }
    LandmarkSet::new(points, base.width(), base.height()).unwrap()
}
