use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of keypoints in a full-body pose (MediaPipe Pose topology).
pub const NUM_LANDMARKS: usize = 33;

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A single detected body keypoint.
///
/// `x` and `y` are normalized to the image dimensions, `z` is relative depth
/// and `visibility` is the detector's confidence that the point is actually
/// visible and correctly located.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Usable as a measurement anchor: visibility at or above the threshold.
    pub fn is_usable(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }

    /// Counted as visible by the quality scoring: visibility strictly above the threshold.
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility > threshold
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
            && self.visibility.is_finite()
    }
}

/// Canonical body keypoint indices (33 total).
///
/// Left/right refer to the subject's body, not the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    pub const ALL: [BodyLandmark; NUM_LANDMARKS] = [
        BodyLandmark::Nose,
        BodyLandmark::LeftEyeInner,
        BodyLandmark::LeftEye,
        BodyLandmark::LeftEyeOuter,
        BodyLandmark::RightEyeInner,
        BodyLandmark::RightEye,
        BodyLandmark::RightEyeOuter,
        BodyLandmark::LeftEar,
        BodyLandmark::RightEar,
        BodyLandmark::MouthLeft,
        BodyLandmark::MouthRight,
        BodyLandmark::LeftShoulder,
        BodyLandmark::RightShoulder,
        BodyLandmark::LeftElbow,
        BodyLandmark::RightElbow,
        BodyLandmark::LeftWrist,
        BodyLandmark::RightWrist,
        BodyLandmark::LeftPinky,
        BodyLandmark::RightPinky,
        BodyLandmark::LeftIndex,
        BodyLandmark::RightIndex,
        BodyLandmark::LeftThumb,
        BodyLandmark::RightThumb,
        BodyLandmark::LeftHip,
        BodyLandmark::RightHip,
        BodyLandmark::LeftKnee,
        BodyLandmark::RightKnee,
        BodyLandmark::LeftAnkle,
        BodyLandmark::RightAnkle,
        BodyLandmark::LeftHeel,
        BodyLandmark::RightHeel,
        BodyLandmark::LeftFootIndex,
        BodyLandmark::RightFootIndex,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A left/right pair of bilateral landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkPair {
    pub left: BodyLandmark,
    pub right: BodyLandmark,
}

impl LandmarkPair {
    pub const EARS: Self = Self::new(BodyLandmark::LeftEar, BodyLandmark::RightEar);
    pub const SHOULDERS: Self = Self::new(BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder);
    pub const WRISTS: Self = Self::new(BodyLandmark::LeftWrist, BodyLandmark::RightWrist);
    pub const HIPS: Self = Self::new(BodyLandmark::LeftHip, BodyLandmark::RightHip);
    pub const KNEES: Self = Self::new(BodyLandmark::LeftKnee, BodyLandmark::RightKnee);
    pub const ANKLES: Self = Self::new(BodyLandmark::LeftAnkle, BodyLandmark::RightAnkle);

    /// Pairs used to judge whether the full body is in frame.
    pub const KEY_BODY: [Self; 4] = [Self::SHOULDERS, Self::HIPS, Self::KNEES, Self::ANKLES];

    pub const fn new(left: BodyLandmark, right: BodyLandmark) -> Self {
        Self { left, right }
    }
}

/// Pixel dimensions of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The full set of 33 keypoints detected in one image.
///
/// Always holds exactly [`NUM_LANDMARKS`] points in canonical order, indexed
/// by [`BodyLandmark`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLandmarkSet", into = "RawLandmarkSet")]
pub struct LandmarkSet {
    landmarks: [Landmark; NUM_LANDMARKS],
    size: ImageSize,
}

/// Wire form of a [`LandmarkSet`] as produced by the pose detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawLandmarkSet {
    landmarks: Vec<Landmark>,
    width: u32,
    height: u32,
}

impl LandmarkSet {
    pub fn new(landmarks: Vec<Landmark>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidLandmarks(format!(
                "image dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if let Some(idx) = landmarks.iter().position(|lm| !lm.is_finite()) {
            return Err(Error::InvalidLandmarks(format!(
                "landmark {} has a non-finite component",
                idx
            )));
        }
        let count = landmarks.len();
        let landmarks: [Landmark; NUM_LANDMARKS] = landmarks.try_into().map_err(|_| {
            Error::InvalidLandmarks(format!(
                "expected {} landmarks, got {}",
                NUM_LANDMARKS, count
            ))
        })?;
        Ok(Self {
            landmarks,
            size: ImageSize::new(width, height),
        })
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn get(&self, part: BodyLandmark) -> &Landmark {
        &self.landmarks[part.index()]
    }

    /// The landmark, if its visibility makes it usable as an anchor.
    pub fn usable(&self, part: BodyLandmark, threshold: f32) -> Option<&Landmark> {
        let lm = self.get(part);
        lm.is_usable(threshold).then_some(lm)
    }

    /// Mean visibility over all 33 points.
    pub fn mean_visibility(&self) -> f32 {
        let total: f32 = self.landmarks.iter().map(|lm| lm.visibility).sum();
        (total / NUM_LANDMARKS as f32).min(1.0)
    }

    /// Pixel coordinates of a usable landmark.
    pub fn pixel_coords(&self, part: BodyLandmark, threshold: f32) -> Option<Point> {
        self.usable(part, threshold).map(|lm| {
            Point::new(
                (lm.x * self.size.width as f32).trunc(),
                (lm.y * self.size.height as f32).trunc(),
            )
        })
    }

    /// Euclidean pixel distance between two usable landmarks.
    pub fn pixel_distance(&self, a: BodyLandmark, b: BodyLandmark, threshold: f32) -> Option<f32> {
        let pa = self.pixel_coords(a, threshold)?;
        let pb = self.pixel_coords(b, threshold)?;
        Some(pa.distance(&pb))
    }
}

impl std::ops::Index<BodyLandmark> for LandmarkSet {
    type Output = Landmark;

    fn index(&self, part: BodyLandmark) -> &Self::Output {
        self.get(part)
    }
}

impl TryFrom<RawLandmarkSet> for LandmarkSet {
    type Error = Error;

    fn try_from(raw: RawLandmarkSet) -> Result<Self> {
        LandmarkSet::new(raw.landmarks, raw.width, raw.height)
    }
}

impl From<LandmarkSet> for RawLandmarkSet {
    fn from(set: LandmarkSet) -> Self {
        RawLandmarkSet {
            landmarks: set.landmarks.to_vec(),
            width: set.size.width,
            height: set.size.height,
        }
    }
}
