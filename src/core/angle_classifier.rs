// Elbow angle classifier: smooths the joint angle and classifies it with a
// hysteresis band so readings near a single cutoff cannot flicker.

use crate::core::config::{ConfigError, ConfigResult, RepetitionEdge};
use crate::core::moving_average::MovingAverage;
use serde::{Deserialize, Serialize};

/// Discrete arm state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmDecision {
    Neutral,
    Flexion,
    Extension,
}

impl ArmDecision {
    pub fn name(&self) -> &'static str {
        match self {
            ArmDecision::Neutral => "NEUTRAL",
            ArmDecision::Flexion => "FLEXION",
            ArmDecision::Extension => "EXTENSION",
        }
    }
}

/// Result of feeding one angle sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub decision: ArmDecision,
    pub smoothed_angle: f32,
    /// True exactly when this sample completed a repetition
    pub repetition: bool,
}

pub struct AngleClassifier {
    window: MovingAverage,
    flex_threshold: f32,
    extend_threshold: f32,
    repetition_edge: RepetitionEdge,
    decision: ArmDecision,
    repetitions: u64,
}

impl AngleClassifier {
    pub fn new(
        window_size: usize,
        flex_threshold: f32,
        extend_threshold: f32,
        repetition_edge: RepetitionEdge,
    ) -> ConfigResult<Self> {
        if window_size == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "moving average window must hold at least one sample".to_string(),
            ));
        }
        if flex_threshold >= extend_threshold {
            return Err(ConfigError::InvalidConfiguration(format!(
                "flex threshold {} must be below extend threshold {}",
                flex_threshold, extend_threshold
            )));
        }

        Ok(Self {
            window: MovingAverage::new(window_size),
            flex_threshold,
            extend_threshold,
            repetition_edge,
            decision: ArmDecision::Neutral,
            repetitions: 0,
        })
    }

    /// Add a raw angle (degrees) and reclassify the smoothed value.
    ///
    /// Below `flex_threshold` → flexion, above `extend_threshold` → extension,
    /// in between the previous decision is kept.
    pub fn push(&mut self, angle: f32) -> Classification {
        self.window.push(angle);
        let smoothed_angle = self.window.average().unwrap_or(angle);

        let previous = self.decision;
        if smoothed_angle < self.flex_threshold {
            self.decision = ArmDecision::Flexion;
        } else if smoothed_angle > self.extend_threshold {
            self.decision = ArmDecision::Extension;
        }

        let repetition = match self.repetition_edge {
            RepetitionEdge::ExtensionToFlexion => {
                previous == ArmDecision::Extension && self.decision == ArmDecision::Flexion
            }
            RepetitionEdge::FlexionToExtension => {
                previous == ArmDecision::Flexion && self.decision == ArmDecision::Extension
            }
        };
        if repetition {
            self.repetitions += 1;
        }

        Classification {
            decision: self.decision,
            smoothed_angle,
            repetition,
        }
    }

    pub fn decision(&self) -> ArmDecision {
        self.decision
    }

    pub fn smoothed_angle(&self) -> Option<f32> {
        self.window.average()
    }

    pub fn repetitions(&self) -> u64 {
        self.repetitions
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.decision = ArmDecision::Neutral;
        self.repetitions = 0;
    }
}
