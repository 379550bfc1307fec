// Synthetic elbow curls for demos and tests

use crate::core::config::Side;
use crate::models::pose::{BodyLandmark, CapturedFrame, Keypoint3D, PoseFrame};
use crate::platform::PoseSource;
use std::f32::consts::TAU;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const FRAME_INTERVAL_MS: i64 = 33;
const UPPER_ARM_PX: f32 = 96.0;
const FOREARM_PX: f32 = 90.0;

/// Elbow angle sweep: fully extended at the start of each repetition,
/// fully flexed half way through
const EXTENDED_DEG: f32 = 170.0;
const FLEXED_DEG: f32 = 30.0;

pub struct CurlSimulator {
    side: Side,
    frames_per_rep: u32,
    total_frames: u64,
    dropout_every: Option<u64>,
    frame_index: u64,
}

impl CurlSimulator {
    pub fn new(side: Side, repetitions: u32, frames_per_rep: u32) -> Self {
        let frames_per_rep = frames_per_rep.max(2);
        Self {
            side,
            frames_per_rep,
            total_frames: u64::from(repetitions) * u64::from(frames_per_rep),
            dropout_every: None,
            frame_index: 0,
        }
    }

    /// Every `n`th frame comes back without a detection
    pub fn with_dropouts(mut self, every: Option<u64>) -> Self {
        self.dropout_every = every.filter(|n| *n > 0);
        self
    }

    /// Elbow angle at a frame, in degrees
    pub fn elbow_angle(&self, frame_index: u64) -> f32 {
        let phase = (frame_index % u64::from(self.frames_per_rep)) as f32
            / self.frames_per_rep as f32;
        let mid = (EXTENDED_DEG + FLEXED_DEG) / 2.0;
        let amplitude = (EXTENDED_DEG - FLEXED_DEG) / 2.0;
        mid + amplitude * (phase * TAU).cos()
    }

    fn pose(&self, timestamp_ms: i64, angle_deg: f32) -> PoseFrame {
        // Mirror the arm for the right side so it stays on the body's side
        let (direction, shoulder, elbow, wrist, other_shoulder) = match self.side {
            Side::Left => (
                1.0,
                BodyLandmark::LeftShoulder,
                BodyLandmark::LeftElbow,
                BodyLandmark::LeftWrist,
                BodyLandmark::RightShoulder,
            ),
            Side::Right => (
                -1.0,
                BodyLandmark::RightShoulder,
                BodyLandmark::RightElbow,
                BodyLandmark::RightWrist,
                BodyLandmark::LeftShoulder,
            ),
        };

        let width = WIDTH as f32;
        let height = HEIGHT as f32;
        let shoulder_px = (width * (0.5 + 0.15 * direction), height * 0.3);
        let elbow_px = (shoulder_px.0, shoulder_px.1 + UPPER_ARM_PX);
        let radians = angle_deg.to_radians();
        let wrist_px = (
            elbow_px.0 + direction * FOREARM_PX * radians.sin(),
            elbow_px.1 - FOREARM_PX * radians.cos(),
        );
        let normalized = |p: (f32, f32)| Keypoint3D::new(p.0 / width, p.1 / height, 0.0, 1.0);

        PoseFrame::new(timestamp_ms)
            .with_joint(shoulder, normalized(shoulder_px))
            .with_joint(elbow, normalized(elbow_px))
            .with_joint(wrist, normalized(wrist_px))
            .with_joint(
                other_shoulder,
                normalized((width * (0.5 - 0.15 * direction), height * 0.3)),
            )
    }
}

impl PoseSource for CurlSimulator {
    fn next_frame(&mut self) -> Option<CapturedFrame> {
        if self.frame_index >= self.total_frames {
            return None;
        }
        let index = self.frame_index;
        self.frame_index += 1;

        let timestamp_ms = index as i64 * FRAME_INTERVAL_MS;
        let dropped = self
            .dropout_every
            .map_or(false, |every| (index + 1) % every == 0);
        let pose = (!dropped).then(|| self.pose(timestamp_ms, self.elbow_angle(index)));

        Some(CapturedFrame {
            timestamp_ms,
            width: WIDTH,
            height: HEIGHT,
            pose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GameConfig;
    use crate::core::pose_metrics::PoseMetrics;
    use crate::core::trigger::{ActivationTrigger, AngleHysteresisTrigger};

    #[test]
    fn test_angle_sweep_extremes() {
        let simulator = CurlSimulator::new(Side::Left, 1, 40);
        assert!((simulator.elbow_angle(0) - EXTENDED_DEG).abs() < 1e-3);
        assert!((simulator.elbow_angle(20) - FLEXED_DEG).abs() < 1e-3);
        assert!((simulator.elbow_angle(40) - EXTENDED_DEG).abs() < 1e-3);
    }

    #[test]
    fn test_generated_geometry_matches_angle() {
        for side in [Side::Left, Side::Right] {
            let mut simulator = CurlSimulator::new(side, 1, 40);
            let frame = simulator.next_frame().unwrap();
            let pose = frame.pose.unwrap();
            let metrics = PoseMetrics::new(&pose, frame.width, frame.height, 0.5);
            let (a, b, c) = AngleHysteresisTrigger::arm_landmarks(side);
            let angle = metrics.angle_between(a, b, c).unwrap();
            assert!((angle - EXTENDED_DEG).abs() < 0.5, "{:?}: {}", side, angle);
        }
    }

    #[test]
    fn test_each_cycle_is_one_repetition() {
        let config = GameConfig::default();
        let mut trigger = AngleHysteresisTrigger::new(&config).unwrap();
        let mut simulator = CurlSimulator::new(Side::Left, 3, 40);

        let mut repetitions = 0;
        let mut frames = 0;
        while let Some(frame) = simulator.next_frame() {
            frames += 1;
            let pose = frame.pose.unwrap();
            let metrics = PoseMetrics::new(&pose, frame.width, frame.height, 0.5);
            if trigger.evaluate(&metrics, None).unwrap() {
                repetitions += 1;
            }
        }
        assert_eq!(frames, 120);
        assert_eq!(repetitions, 3);
    }

    #[test]
    fn test_dropouts() {
        let mut simulator = CurlSimulator::new(Side::Left, 1, 10).with_dropouts(Some(5));
        let detected: Vec<bool> = std::iter::from_fn(|| simulator.next_frame())
            .map(|frame| frame.pose.is_some())
            .collect();
        assert_eq!(
            detected,
            vec![true, true, true, true, false, true, true, true, true, false]
        );
    }
}
