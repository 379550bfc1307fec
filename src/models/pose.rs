// Data models for per-frame body pose tracking

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ==============================================================================
// Body Landmarks (33 keypoints)
// ==============================================================================

/// MediaPipe Pose landmark indices (33 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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
    /// All landmarks in detector index order
    pub const ALL: [BodyLandmark; 33] = [
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

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            BodyLandmark::Nose => "nose",
            BodyLandmark::LeftEyeInner => "left_eye_inner",
            BodyLandmark::LeftEye => "left_eye",
            BodyLandmark::LeftEyeOuter => "left_eye_outer",
            BodyLandmark::RightEyeInner => "right_eye_inner",
            BodyLandmark::RightEye => "right_eye",
            BodyLandmark::RightEyeOuter => "right_eye_outer",
            BodyLandmark::LeftEar => "left_ear",
            BodyLandmark::RightEar => "right_ear",
            BodyLandmark::MouthLeft => "mouth_left",
            BodyLandmark::MouthRight => "mouth_right",
            BodyLandmark::LeftShoulder => "left_shoulder",
            BodyLandmark::RightShoulder => "right_shoulder",
            BodyLandmark::LeftElbow => "left_elbow",
            BodyLandmark::RightElbow => "right_elbow",
            BodyLandmark::LeftWrist => "left_wrist",
            BodyLandmark::RightWrist => "right_wrist",
            BodyLandmark::LeftPinky => "left_pinky",
            BodyLandmark::RightPinky => "right_pinky",
            BodyLandmark::LeftIndex => "left_index",
            BodyLandmark::RightIndex => "right_index",
            BodyLandmark::LeftThumb => "left_thumb",
            BodyLandmark::RightThumb => "right_thumb",
            BodyLandmark::LeftHip => "left_hip",
            BodyLandmark::RightHip => "right_hip",
            BodyLandmark::LeftKnee => "left_knee",
            BodyLandmark::RightKnee => "right_knee",
            BodyLandmark::LeftAnkle => "left_ankle",
            BodyLandmark::RightAnkle => "right_ankle",
            BodyLandmark::LeftHeel => "left_heel",
            BodyLandmark::RightHeel => "right_heel",
            BodyLandmark::LeftFootIndex => "left_foot_index",
            BodyLandmark::RightFootIndex => "right_foot_index",
        }
    }
}

impl fmt::Display for BodyLandmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BodyLandmark {
    type Err = PoseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|landmark| landmark.name() == s)
            .ok_or_else(|| PoseError::UnknownLandmark(s.to_string()))
    }
}

/// Connections drawn as the skeleton overlay (arms, torso, legs)
pub const SKELETON_CONNECTIONS: [(BodyLandmark, BodyLandmark); 12] = [
    (BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder),
    (BodyLandmark::LeftShoulder, BodyLandmark::LeftElbow),
    (BodyLandmark::LeftElbow, BodyLandmark::LeftWrist),
    (BodyLandmark::RightShoulder, BodyLandmark::RightElbow),
    (BodyLandmark::RightElbow, BodyLandmark::RightWrist),
    (BodyLandmark::LeftShoulder, BodyLandmark::LeftHip),
    (BodyLandmark::RightShoulder, BodyLandmark::RightHip),
    (BodyLandmark::LeftHip, BodyLandmark::RightHip),
    (BodyLandmark::LeftHip, BodyLandmark::LeftKnee),
    (BodyLandmark::LeftKnee, BodyLandmark::LeftAnkle),
    (BodyLandmark::RightHip, BodyLandmark::RightKnee),
    (BodyLandmark::RightKnee, BodyLandmark::RightAnkle),
];

// ==============================================================================
// Keypoints and Joints
// ==============================================================================

/// A 3D keypoint with visibility score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint3D {
    pub x: f32, // Normalized [0, 1] for image coordinates
    pub y: f32, // Normalized [0, 1] for image coordinates
    #[serde(default)]
    pub z: f32, // Depth relative to the hip midpoint
    #[serde(default = "default_visibility")]
    pub visibility: f32,
}

fn default_visibility() -> f32 {
    1.0
}

impl Keypoint3D {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }
}

/// A labelled keypoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pub landmark: BodyLandmark,
    pub position: Keypoint3D,
}

/// A point in frame pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point2D) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ==============================================================================
// Pose Frame
// ==============================================================================

/// All joints detected in one camera frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseFrame {
    pub timestamp_ms: i64,
    pub joints: BTreeMap<BodyLandmark, Keypoint3D>,
}

impl PoseFrame {
    pub fn new(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            joints: BTreeMap::new(),
        }
    }

    /// Build a frame from a detector's indexed output (index = landmark id).
    /// Extra entries beyond the 33 known landmarks are ignored.
    pub fn from_landmark_array(timestamp_ms: i64, keypoints: &[Keypoint3D]) -> Self {
        let joints = keypoints
            .iter()
            .enumerate()
            .filter_map(|(index, keypoint)| {
                BodyLandmark::from_index(index).map(|landmark| (landmark, *keypoint))
            })
            .collect();

        Self { timestamp_ms, joints }
    }

    pub fn with_joint(mut self, landmark: BodyLandmark, keypoint: Keypoint3D) -> Self {
        self.joints.insert(landmark, keypoint);
        self
    }

    pub fn joint(&self, landmark: BodyLandmark) -> Option<Joint> {
        self.joints.get(&landmark).map(|position| Joint {
            landmark,
            position: *position,
        })
    }
}

/// Largest accepted frame edge in pixels
pub const MAX_FRAME_DIMENSION: u32 = 8192;

/// Both edges non-zero and at most `MAX_FRAME_DIMENSION`
pub fn is_valid_frame_size(width: u32, height: u32) -> bool {
    (1..=MAX_FRAME_DIMENSION).contains(&width) && (1..=MAX_FRAME_DIMENSION).contains(&height)
}

/// One tick of input from the pose source
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub timestamp_ms: i64,
    pub width: u32,
    pub height: u32,
    /// `None` when the detector found nobody in this frame
    pub pose: Option<PoseFrame>,
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoseError {
    #[error("Landmark missing from this frame: {0}")]
    MissingLandmark(BodyLandmark),

    #[error("Degenerate joint geometry: {0}")]
    DegenerateAngle(String),

    #[error("Unknown landmark name: {0}")]
    UnknownLandmark(String),
}

pub type PoseResult<T> = Result<T, PoseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint3d_visibility() {
        let keypoint = Keypoint3D::new(0.5, 0.5, 0.0, 0.8);
        assert!(keypoint.is_visible(0.5));
        assert!(keypoint.is_visible(0.7));
        assert!(!keypoint.is_visible(0.9));
    }

    #[test]
    fn test_landmark_index_and_name() {
        assert_eq!(BodyLandmark::from_index(15), Some(BodyLandmark::LeftWrist));
        assert_eq!(BodyLandmark::from_index(33), None);
        assert_eq!(BodyLandmark::RightKnee.index(), 26);
        assert_eq!("left_elbow".parse::<BodyLandmark>(), Ok(BodyLandmark::LeftElbow));
        assert!("left_antenna".parse::<BodyLandmark>().is_err());
    }

    #[test]
    fn test_frame_size_limits() {
        assert!(is_valid_frame_size(640, 480));
        assert!(is_valid_frame_size(MAX_FRAME_DIMENSION, 1));
        assert!(!is_valid_frame_size(0, 480));
        assert!(!is_valid_frame_size(640, 0));
        assert!(!is_valid_frame_size(u32::MAX, u32::MAX));
        assert!(!is_valid_frame_size(MAX_FRAME_DIMENSION + 1, 480));
    }

    #[test]
    fn test_frame_from_landmark_array() {
        let points: Vec<Keypoint3D> = (0..33)
            .map(|i| Keypoint3D::new(i as f32 / 33.0, 0.5, 0.0, 1.0))
            .collect();
        let frame = PoseFrame::from_landmark_array(42, &points);

        assert_eq!(frame.joints.len(), 33);
        let wrist = frame.joint(BodyLandmark::LeftWrist).unwrap();
        assert!((wrist.position.x - 15.0 / 33.0).abs() < 1e-6);
    }

    #[test]
    fn test_frame_deserializes_snake_case_joints() {
        let json = r#"{"timestamp_ms": 7, "joints": {"right_wrist": {"x": 0.25, "y": 0.75}}}"#;
        let frame: PoseFrame = serde_json::from_str(json).unwrap();

        let wrist = frame.joint(BodyLandmark::RightWrist).unwrap();
        assert_eq!(wrist.position.visibility, 1.0);
        assert_eq!(wrist.position.y, 0.75);
    }
}
