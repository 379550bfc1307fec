// Activation triggers: decide, from one detected frame, whether the game
// should advance. Geometric hit-testing drives the balloon game, elbow angle
// hysteresis drives the inflation game.

use crate::core::angle_classifier::{AngleClassifier, ArmDecision, Classification};
use crate::core::config::{ConfigResult, GameConfig, Side, StageAdvance, Variant};
use crate::core::exercise::TriggerTarget;
use crate::core::hit_tester;
use crate::core::pose_metrics::PoseMetrics;
use crate::models::pose::{BodyLandmark, PoseResult};
use tracing::trace;

pub trait ActivationTrigger: Send {
    fn name(&self) -> &'static str;

    /// Evaluate one detected frame against the game's current hit target.
    ///
    /// `Err(MissingLandmark)` and `Err(DegenerateAngle)` leave the trigger's
    /// state untouched; the caller skips interactive updates for the tick.
    fn evaluate(
        &mut self,
        metrics: &PoseMetrics<'_>,
        target: Option<&TriggerTarget>,
    ) -> PoseResult<bool>;

    /// Short status line for the overlay
    fn describe(&self) -> Option<String> {
        None
    }

    fn reset(&mut self);
}

/// Build the trigger matching the configured variant
pub fn trigger_for_config(config: &GameConfig) -> ConfigResult<Box<dyn ActivationTrigger>> {
    match config.variant {
        Variant::Balloon => Ok(Box::new(GeometricHitTrigger::new(
            config.stage_advance,
        ))),
        Variant::Elbow => Ok(Box::new(AngleHysteresisTrigger::new(config)?)),
    }
}

// ==============================================================================
// Geometric Hit
// ==============================================================================

/// Fires when the active limb's tracked joint is inside the target rectangle
pub struct GeometricHitTrigger {
    policy: StageAdvance,
    was_inside: bool,
    last_target_id: Option<u64>,
}

impl GeometricHitTrigger {
    pub fn new(policy: StageAdvance) -> Self {
        Self {
            policy,
            was_inside: false,
            last_target_id: None,
        }
    }
}

impl ActivationTrigger for GeometricHitTrigger {
    fn name(&self) -> &'static str {
        "geometric_hit"
    }

    fn evaluate(
        &mut self,
        metrics: &PoseMetrics<'_>,
        target: Option<&TriggerTarget>,
    ) -> PoseResult<bool> {
        let Some(target) = target else {
            self.was_inside = false;
            return Ok(false);
        };

        let point = metrics.joint_position(target.limb.tracked_landmark())?;
        let inside = hit_tester::is_point_in_rect(point, &target.rect);

        // A respawned balloon is a fresh entry even if the limb never left
        if self.last_target_id != Some(target.target_id) {
            self.was_inside = false;
            self.last_target_id = Some(target.target_id);
        }

        let fire = match self.policy {
            StageAdvance::Level => inside,
            StageAdvance::Edge => inside && !self.was_inside,
        };
        self.was_inside = inside;

        trace!(limb = %target.limb, x = point.x, y = point.y, inside, fire, "Hit test");
        Ok(fire)
    }

    fn reset(&mut self) {
        self.was_inside = false;
        self.last_target_id = None;
    }
}

// ==============================================================================
// Angle Hysteresis
// ==============================================================================

/// Fires once per repetition of the monitored elbow
pub struct AngleHysteresisTrigger {
    classifier: AngleClassifier,
    side: Side,
    last: Option<Classification>,
}

impl AngleHysteresisTrigger {
    pub fn new(config: &GameConfig) -> ConfigResult<Self> {
        Ok(Self {
            classifier: AngleClassifier::new(
                config.moving_average_window,
                config.flex_threshold,
                config.extend_threshold,
                config.repetition_edge,
            )?,
            side: config.monitored_arm,
            last: None,
        })
    }

    /// Shoulder, elbow and wrist of the monitored arm
    pub fn arm_landmarks(side: Side) -> (BodyLandmark, BodyLandmark, BodyLandmark) {
        match side {
            Side::Left => (
                BodyLandmark::LeftShoulder,
                BodyLandmark::LeftElbow,
                BodyLandmark::LeftWrist,
            ),
            Side::Right => (
                BodyLandmark::RightShoulder,
                BodyLandmark::RightElbow,
                BodyLandmark::RightWrist,
            ),
        }
    }

    pub fn decision(&self) -> ArmDecision {
        self.classifier.decision()
    }
}

impl ActivationTrigger for AngleHysteresisTrigger {
    fn name(&self) -> &'static str {
        "angle_hysteresis"
    }

    fn evaluate(
        &mut self,
        metrics: &PoseMetrics<'_>,
        _target: Option<&TriggerTarget>,
    ) -> PoseResult<bool> {
        let (shoulder, elbow, wrist) = Self::arm_landmarks(self.side);
        let angle = metrics.angle_between(shoulder, elbow, wrist)?;

        let classification = self.classifier.push(angle);
        trace!(
            angle,
            smoothed = classification.smoothed_angle,
            decision = classification.decision.name(),
            "Elbow classified"
        );
        self.last = Some(classification);
        Ok(classification.repetition)
    }

    fn describe(&self) -> Option<String> {
        self.last.map(|c| {
            format!(
                "{} ({:.0} deg)",
                c.decision.name(),
                c.smoothed_angle
            )
        })
    }

    fn reset(&mut self) {
        self.classifier.reset();
        self.last = None;
    }
}
