// Data models for the balloon exercise games

use crate::models::pose::{BodyLandmark, Point2D};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==============================================================================
// Limbs and Screen Regions
// ==============================================================================

/// Body part the player must use to hit the active balloon
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limb {
    LeftHand,
    LeftKnee,
    RightHand,
    RightKnee,
}

impl Limb {
    /// The landmark that is hit-tested for this limb
    pub fn tracked_landmark(&self) -> BodyLandmark {
        match self {
            Limb::LeftHand => BodyLandmark::LeftWrist,
            Limb::LeftKnee => BodyLandmark::LeftKnee,
            Limb::RightHand => BodyLandmark::RightWrist,
            Limb::RightKnee => BodyLandmark::RightKnee,
        }
    }

    pub fn color(&self) -> Rgb {
        match self {
            Limb::LeftHand => Rgb::GREEN,
            Limb::LeftKnee => Rgb::YELLOW,
            Limb::RightHand => Rgb::BLUE,
            Limb::RightKnee => Rgb::RED,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Limb::LeftHand => "left_hand",
            Limb::LeftKnee => "left_knee",
            Limb::RightHand => "right_hand",
            Limb::RightKnee => "right_knee",
        }
    }
}

impl fmt::Display for Limb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One quarter of the camera frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    TopLeft,
    BottomLeft,
    TopRight,
    BottomRight,
}

/// Half-open placement range `[x_min, x_max) × [y_min, y_max)` for a balloon's
/// top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementBounds {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl Quadrant {
    /// Where a balloon of `size` pixels may be placed so it stays inside this
    /// quadrant of a `width × height` frame. Empty ranges collapse to their
    /// lower bound.
    pub fn placement_bounds(&self, width: u32, height: u32, size: u32) -> PlacementBounds {
        let half_w = width / 2;
        let half_h = height / 2;

        let (x_min, x_max) = match self {
            Quadrant::TopLeft | Quadrant::BottomLeft => (0, half_w.saturating_sub(size)),
            Quadrant::TopRight | Quadrant::BottomRight => (half_w, width.saturating_sub(size)),
        };
        let (y_min, y_max) = match self {
            Quadrant::TopLeft | Quadrant::TopRight => (0, half_h.saturating_sub(size)),
            Quadrant::BottomLeft | Quadrant::BottomRight => (half_h, height.saturating_sub(size)),
        };

        PlacementBounds {
            x_min,
            x_max: x_max.max(x_min),
            y_min,
            y_max: y_max.max(y_min),
        }
    }
}

// ==============================================================================
// Targets
// ==============================================================================

/// Axis-aligned hit-box in pixel space, half-open on the right and bottom edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl TargetRect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_location(location: (u32, u32), size: u32) -> Self {
        let (x, y) = (location.0 as f32, location.1 as f32);
        Self::new(x, y, x + size as f32, y + size as f32)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn center(&self) -> Point2D {
        Point2D::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }
}

/// The balloon currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalloonTarget {
    pub target_id: u64,
    /// Inflation stage, always within `0..=stage_count`
    pub stage: u8,
    /// Top-left corner in pixels
    pub location: (u32, u32),
    /// Index into the configured limb set
    pub active_limb_index: usize,
}

// ==============================================================================
// Explosion Effect
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const GREEN: Rgb = Rgb(0, 200, 0);
    pub const YELLOW: Rgb = Rgb(240, 220, 0);
    pub const BLUE: Rgb = Rgb(30, 90, 255);
    pub const RED: Rgb = Rgb(230, 30, 30);
    pub const ORANGE: Rgb = Rgb(255, 140, 0);
}

/// A single piece of a popped balloon, moved by its velocity each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplosionFragment {
    pub position: Point2D,
    pub size: f32,
    pub color: Rgb,
    pub velocity: Point2D,
}

impl ExplosionFragment {
    pub fn advance(&mut self) {
        self.position.x += self.velocity.x;
        self.position.y += self.velocity.y;
    }
}

// ==============================================================================
// Game Events
// ==============================================================================

/// Notable state transitions reported by a game after each tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    StageAdvanced { stage: u8 },
    Popped { limb: Limb, popped_count: u32 },
    Respawned { limb: Limb, location: (u32, u32) },
    SessionFinished { popped_count: u32, finish_time_ms: i64, elapsed_ms: i64 },
    Repetition { count: u32, size: f32 },
    Exploded { repetitions: u32 },
    ExplosionCleared,
    Restarted,
}

/// Coarse phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Playing,
    Exploding,
    Finished,
}
