// Pose metrics - joint positions, joint angles and a camera distance estimate
// derived from one pose frame. Pure and stateless.

use crate::core::config::DistanceConfig;
use crate::models::pose::{BodyLandmark, Keypoint3D, Point2D, PoseError, PoseFrame, PoseResult};

/// Segments shorter than this (in pixels) cannot define an angle
const MIN_SEGMENT_LENGTH: f32 = 1e-3;

/// Shoulder spans below this (normalized) cannot be turned into a distance
const MIN_SHOULDER_SPAN: f32 = 1e-4;

/// Where the player stands relative to the comfortable camera range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceBand {
    TooClose,
    InRange,
    TooFar,
}

impl DistanceBand {
    pub fn classify(distance_m: f32, config: &DistanceConfig) -> Self {
        if distance_m < config.min_distance_m {
            DistanceBand::TooClose
        } else if distance_m > config.max_distance_m {
            DistanceBand::TooFar
        } else {
            DistanceBand::InRange
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            DistanceBand::TooClose => "You are out of range! Move away from the camera.",
            DistanceBand::InRange => "You are in range.",
            DistanceBand::TooFar => "You are out of range! Move closer to the camera.",
        }
    }
}

/// Read-only view over one frame's joints, scaled to the frame's pixel size
pub struct PoseMetrics<'a> {
    frame: &'a PoseFrame,
    width: u32,
    height: u32,
    min_visibility: f32,
}

impl<'a> PoseMetrics<'a> {
    pub fn new(frame: &'a PoseFrame, width: u32, height: u32, min_visibility: f32) -> Self {
        Self {
            frame,
            width,
            height,
            min_visibility,
        }
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Normalized keypoint; low-visibility joints count as missing
    pub fn keypoint(&self, landmark: BodyLandmark) -> PoseResult<Keypoint3D> {
        self.frame
            .joints
            .get(&landmark)
            .filter(|keypoint| keypoint.is_visible(self.min_visibility))
            .copied()
            .ok_or(PoseError::MissingLandmark(landmark))
    }

    /// Joint position in frame pixels
    pub fn joint_position(&self, landmark: BodyLandmark) -> PoseResult<Point2D> {
        let keypoint = self.keypoint(landmark)?;
        Ok(Point2D::new(
            keypoint.x * self.width as f32,
            keypoint.y * self.height as f32,
        ))
    }

    /// Angle at `b` formed by `a` and `c`, in degrees within [0, 180]
    pub fn angle_between(
        &self,
        a: BodyLandmark,
        b: BodyLandmark,
        c: BodyLandmark,
    ) -> PoseResult<f32> {
        let a = self.joint_position(a)?;
        let b = self.joint_position(b)?;
        let c = self.joint_position(c)?;
        angle_between_points(a, b, c)
    }

    /// Approximate camera distance in meters from the shoulder span.
    ///
    /// The span shrinks linearly with distance, so
    /// `distance = reference_distance × reference_span / span`. This is a
    /// coaching signal only; it ignores body size and shoulder rotation.
    pub fn estimate_distance(&self, calibration: &DistanceConfig) -> PoseResult<f32> {
        let left = self.keypoint(BodyLandmark::LeftShoulder)?;
        let right = self.keypoint(BodyLandmark::RightShoulder)?;

        let dx = right.x - left.x;
        let dy = right.y - left.y;
        let span = (dx * dx + dy * dy).sqrt();

        if span < MIN_SHOULDER_SPAN {
            return Err(PoseError::DegenerateAngle(
                "shoulders overlap, cannot estimate distance".to_string(),
            ));
        }

        Ok(calibration.reference_distance_m * calibration.reference_shoulder_span / span)
    }
}

/// Angle at vertex `b` between the vectors b→a and b→c
///
/// Uses cos(θ) = (v1 · v2) / (|v1| × |v2|), clamped so rounding never yields NaN.
pub fn angle_between_points(a: Point2D, b: Point2D, c: Point2D) -> PoseResult<f32> {
    let v1 = (a.x - b.x, a.y - b.y);
    let v2 = (c.x - b.x, c.y - b.y);

    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();

    if mag1 < MIN_SEGMENT_LENGTH || mag2 < MIN_SEGMENT_LENGTH {
        return Err(PoseError::DegenerateAngle(format!(
            "segment lengths {:.4} and {:.4} are too short",
            mag1, mag2
        )));
    }

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);

    Ok(cos_angle.acos().to_degrees())
}
