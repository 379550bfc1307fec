// Per-frame interaction loop
// frame -> pose metrics -> activation trigger -> game -> announcer -> overlay

use crate::core::announcer::Announcer;
use crate::core::config::{ConfigResult, DistanceConfig, GameConfig};
use crate::core::exercise::{game_for_config, ExerciseGame, TickContext};
use crate::core::feedback_channel::FeedbackHandle;
use crate::core::overlay::OverlayBuilder;
use crate::core::pose_metrics::{DistanceBand, PoseMetrics};
use crate::core::random::RandomSource;
use crate::core::trigger::{trigger_for_config, ActivationTrigger};
use crate::models::feedback::{FeedbackError, FeedbackStats};
use crate::models::game::{GameEvent, SessionPhase};
use crate::models::pose::{CapturedFrame, PoseError};
use crate::models::render::DrawCommand;
use crate::platform::{PoseSource, RenderSurface};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    /// False when the frame had no usable detection for the trigger
    pub detected: bool,
    pub activated: bool,
    pub events: Vec<GameEvent>,
}

/// Totals for one run of the loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub game: String,
    pub frames: u64,
    pub detection_gaps: u64,
    pub activations: u64,
    /// Balloons popped or repetitions counted
    pub completed: u32,
    pub explosions: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Frame timestamp at which the session target was reached
    pub finish_time_ms: Option<i64>,
    pub feedback: FeedbackStats,
}

pub struct SessionLoop<S: PoseSource, R: RenderSurface> {
    source: S,
    surface: R,
    trigger: Box<dyn ActivationTrigger>,
    game: Box<dyn ExerciseGame>,
    announcer: Announcer,
    feedback: FeedbackHandle,
    rng: Box<dyn RandomSource>,
    min_visibility: f32,
    distance: DistanceConfig,

    session_id: Uuid,
    started_at: Option<DateTime<Utc>>,
    last_overlay: Vec<DrawCommand>,
    frames: u64,
    detection_gaps: u64,
    activations: u64,
}

impl<S: PoseSource, R: RenderSurface> SessionLoop<S, R> {
    /// Validate the configuration and assemble the loop. Nothing is processed
    /// until `tick` or `run` is called.
    pub fn new(
        config: &GameConfig,
        source: S,
        surface: R,
        feedback: FeedbackHandle,
        rng: Box<dyn RandomSource>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let trigger = trigger_for_config(config)?;
        let game = game_for_config(config)?;
        let session_id = Uuid::new_v4();

        info!(
            session_id = %session_id,
            game = game.name(),
            trigger = trigger.name(),
            "Session created"
        );

        Ok(Self {
            source,
            surface,
            trigger,
            game,
            announcer: Announcer::new(config),
            feedback,
            rng,
            min_visibility: config.min_landmark_visibility,
            distance: config.distance.clone(),
            session_id,
            started_at: None,
            last_overlay: Vec::new(),
            frames: 0,
            detection_gaps: 0,
            activations: 0,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn game(&self) -> &dyn ExerciseGame {
        self.game.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        self.game.phase()
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    /// Overlay re-rendered while the detector loses the player
    pub fn last_overlay(&self) -> &[DrawCommand] {
        &self.last_overlay
    }

    /// Process one frame. Returns `None` once the source is exhausted.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        let frame = self.source.next_frame()?;
        self.started_at.get_or_insert_with(Utc::now);
        self.frames += 1;

        let outcome = self.process(&frame);
        self.announce(&outcome.events);
        self.render(frame.width, frame.height);
        Some(outcome)
    }

    fn process(&mut self, frame: &CapturedFrame) -> TickOutcome {
        let ctx = TickContext {
            timestamp_ms: frame.timestamp_ms,
            width: frame.width,
            height: frame.height,
        };
        let mut outcome = TickOutcome {
            events: self.game.begin_tick(&ctx, self.rng.as_mut()),
            ..Default::default()
        };

        let Some(pose) = &frame.pose else {
            self.detection_gaps += 1;
            debug!(frame = self.frames, "No detection, keeping last overlay");
            return outcome;
        };

        let metrics = PoseMetrics::new(pose, frame.width, frame.height, self.min_visibility);
        let target = self.game.hit_target();

        match self.trigger.evaluate(&metrics, target.as_ref()) {
            Ok(fire) => {
                outcome.detected = true;
                if fire && self.game.accepts_activation() {
                    outcome.activated = true;
                    self.activations += 1;
                    let events = self.game.activate(&ctx, self.rng.as_mut());
                    outcome.events.extend(events);
                }
            }
            Err(PoseError::DegenerateAngle(reason)) => {
                // Pose is there, the geometry just cannot be trusted this tick
                outcome.detected = true;
                debug!(frame = self.frames, reason = %reason, "Degenerate joint geometry, decision kept");
            }
            Err(e) => {
                self.detection_gaps += 1;
                debug!(frame = self.frames, error = %e, "Skipping interactive update");
                return outcome;
            }
        }

        let mut overlay = OverlayBuilder::new();
        overlay.skeleton(&metrics).game(self.game.as_ref(), &ctx);
        if let Some(status) = self.trigger.describe() {
            overlay.status(status, &ctx);
        }
        match metrics.estimate_distance(&self.distance) {
            Ok(distance) => {
                overlay.distance_hint(DistanceBand::classify(distance, &self.distance), &ctx);
            }
            Err(e) => debug!(error = %e, "Distance unavailable"),
        }
        self.last_overlay = overlay.build();

        outcome
    }

    fn announce(&mut self, events: &[GameEvent]) {
        for event in events {
            let Some(message) = self.announcer.announce(event, self.rng.as_mut()) else {
                continue;
            };
            match self.feedback.enqueue(message) {
                Ok(()) => {}
                Err(FeedbackError::QueueSaturation { .. }) => {
                    debug!(?event, "Feedback dropped, queue saturated");
                }
                Err(e) => warn!(error = %e, "Could not queue feedback"),
            }
        }
    }

    fn render(&mut self, width: u32, height: u32) {
        if let Err(e) = self.surface.begin_frame(width, height) {
            warn!(frame = self.frames, error = %e, "Skipping frame render");
            return;
        }
        for command in &self.last_overlay {
            self.surface.draw(command);
        }
        if let Err(e) = self.surface.present() {
            warn!(frame = self.frames, error = %e, "Failed to present frame");
        }
    }

    /// Tick until the source runs dry, `max_frames` frames were processed in
    /// this call, or the game reports the session finished
    pub fn run(&mut self, max_frames: Option<u64>) -> SessionSummary {
        info!(session_id = %self.session_id, game = self.game.name(), "Session running");
        let mut processed = 0u64;

        while max_frames.map_or(true, |max| processed < max) {
            if self.tick().is_none() {
                debug!("Pose source exhausted");
                break;
            }
            processed += 1;

            if self.game.phase() == SessionPhase::Finished {
                break;
            }
        }

        let summary = self.summary();
        info!(
            session_id = %summary.session_id,
            frames = summary.frames,
            gaps = summary.detection_gaps,
            completed = summary.completed,
            explosions = summary.explosions,
            "Session ended"
        );
        summary
    }

    /// Explicit restart event: the game returns to its initial values
    pub fn restart(&mut self) -> Vec<GameEvent> {
        let events = self.game.restart();
        self.trigger.reset();
        self.last_overlay.clear();
        self.announce(&events);
        events
    }

    pub fn summary(&self) -> SessionSummary {
        let progress = self.game.progress();
        let ended_at = Utc::now();
        SessionSummary {
            session_id: self.session_id,
            game: self.game.name().to_string(),
            frames: self.frames,
            detection_gaps: self.detection_gaps,
            activations: self.activations,
            completed: progress.completed,
            explosions: progress.explosions,
            started_at: self.started_at.unwrap_or(ended_at),
            ended_at,
            finish_time_ms: progress.finish_time_ms,
            feedback: self.feedback.stats(),
        }
    }
}
