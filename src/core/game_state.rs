// Balloon game state machine: inflate by touching, pop at the last stage,
// respawn for a different limb in that limb's screen quadrant.

use crate::core::config::{ConfigResult, GameConfig};
use crate::core::exercise::{ExerciseGame, GameProgress, TickContext, TriggerTarget};
use crate::core::overlay;
use crate::core::random::RandomSource;
use crate::models::game::{BalloonTarget, GameEvent, Limb, Quadrant, SessionPhase, TargetRect};
use crate::models::render::DrawCommand;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub struct GameState {
    stage_count: u8,
    session_target: u32,
    balloon_size: u32,
    limb_set: Vec<Limb>,
    quadrant_map: BTreeMap<Limb, Quadrant>,
    initial_location: (u32, u32),
    initial_limb_index: usize,

    target: BalloonTarget,
    popped_count: u32,
    next_target_id: u64,
    started_at_ms: Option<i64>,
    finish_time_ms: Option<i64>,
}

impl GameState {
    /// Build the initial state. Rejects configurations the respawn rule cannot
    /// satisfy (fewer than two limbs, limbs without a quadrant, ...).
    pub fn new(config: &GameConfig) -> ConfigResult<Self> {
        config.validate()?;

        Ok(Self {
            stage_count: config.balloon_stage_count,
            session_target: config.session_target_pops,
            balloon_size: config.balloon_size_px,
            limb_set: config.limb_set.clone(),
            quadrant_map: config.quadrant_map.clone(),
            initial_location: config.initial_location,
            initial_limb_index: config.initial_limb_index,
            target: BalloonTarget {
                target_id: 0,
                stage: 0,
                location: config.initial_location,
                active_limb_index: config.initial_limb_index,
            },
            popped_count: 0,
            next_target_id: 1,
            started_at_ms: None,
            finish_time_ms: None,
        })
    }

    pub fn target(&self) -> &BalloonTarget {
        &self.target
    }

    pub fn stage_count(&self) -> u8 {
        self.stage_count
    }

    pub fn session_target(&self) -> u32 {
        self.session_target
    }

    pub fn active_limb(&self) -> Limb {
        self.limb_set[self.target.active_limb_index]
    }

    pub fn target_rect(&self) -> TargetRect {
        TargetRect::from_location(self.target.location, self.balloon_size)
    }

    pub fn popped_count(&self) -> u32 {
        self.popped_count
    }

    pub fn is_finished(&self) -> bool {
        self.finish_time_ms.is_some()
    }

    pub fn finish_time_ms(&self) -> Option<i64> {
        self.finish_time_ms
    }

    /// Milliseconds since the first tick, frozen once the session finishes.
    /// Never negative, even when frame timestamps run backwards.
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        let Some(start) = self.started_at_ms else {
            return 0;
        };
        self.finish_time_ms
            .unwrap_or(now_ms)
            .saturating_sub(start)
            .max(0)
    }

    /// Record the session start; later calls are ignored
    pub fn begin(&mut self, timestamp_ms: i64) {
        self.started_at_ms.get_or_insert(timestamp_ms);
    }

    /// Apply one confirmed hit on the active balloon.
    ///
    /// Below the last stage the balloon grows one stage. At the last stage it
    /// pops, the pop counter increments and a new balloon spawns for another
    /// limb. Hits after the session target is reached are ignored.
    pub fn register_hit(
        &mut self,
        frame_size: (u32, u32),
        timestamp_ms: i64,
        rng: &mut dyn RandomSource,
    ) -> Vec<GameEvent> {
        if self.is_finished() {
            return Vec::new();
        }
        self.begin(timestamp_ms);

        if self.target.stage < self.stage_count {
            self.target.stage += 1;
            debug!(stage = self.target.stage, limb = %self.active_limb(), "Balloon inflated");
            return vec![GameEvent::StageAdvanced {
                stage: self.target.stage,
            }];
        }

        let popped_limb = self.active_limb();
        self.popped_count += 1;
        let mut events = vec![GameEvent::Popped {
            limb: popped_limb,
            popped_count: self.popped_count,
        }];

        self.respawn(frame_size, rng);
        events.push(GameEvent::Respawned {
            limb: self.active_limb(),
            location: self.target.location,
        });
        info!(
            popped = self.popped_count,
            next_limb = %self.active_limb(),
            "Balloon popped"
        );

        if self.popped_count >= self.session_target {
            self.finish_time_ms = Some(timestamp_ms);
            let elapsed_ms = self.elapsed_ms(timestamp_ms);
            info!(popped = self.popped_count, elapsed_ms, "Session finished");
            events.push(GameEvent::SessionFinished {
                popped_count: self.popped_count,
                finish_time_ms: timestamp_ms,
                elapsed_ms,
            });
        }

        events
    }

    /// Reset counters, stage, location and active limb to their initial values
    pub fn restart(&mut self) -> GameEvent {
        self.target = BalloonTarget {
            target_id: self.next_target_id,
            stage: 0,
            location: self.initial_location,
            active_limb_index: self.initial_limb_index,
        };
        self.next_target_id += 1;
        self.popped_count = 0;
        self.started_at_ms = None;
        self.finish_time_ms = None;
        info!("Balloon session restarted");
        GameEvent::Restarted
    }

    fn respawn(&mut self, frame_size: (u32, u32), rng: &mut dyn RandomSource) {
        let current = self.target.active_limb_index;
        // Uniform over every index except the current one
        let draw = rng.next_index(self.limb_set.len() - 1);
        let next_index = if draw >= current { draw + 1 } else { draw };

        let limb = self.limb_set[next_index];
        let quadrant = self
            .quadrant_map
            .get(&limb)
            .copied()
            .unwrap_or(Quadrant::TopLeft);
        let bounds = quadrant.placement_bounds(frame_size.0, frame_size.1, self.balloon_size);
        let location = (
            rng.next_in_range(bounds.x_min, bounds.x_max),
            rng.next_in_range(bounds.y_min, bounds.y_max),
        );

        self.target = BalloonTarget {
            target_id: self.next_target_id,
            stage: 0,
            location,
            active_limb_index: next_index,
        };
        self.next_target_id += 1;
    }
}

impl ExerciseGame for GameState {
    fn name(&self) -> &'static str {
        "balloon"
    }

    fn begin_tick(&mut self, ctx: &TickContext, _rng: &mut dyn RandomSource) -> Vec<GameEvent> {
        self.begin(ctx.timestamp_ms);
        Vec::new()
    }

    fn hit_target(&self) -> Option<TriggerTarget> {
        if self.is_finished() {
            return None;
        }
        Some(TriggerTarget {
            target_id: self.target.target_id,
            limb: self.active_limb(),
            rect: self.target_rect(),
        })
    }

    fn accepts_activation(&self) -> bool {
        !self.is_finished()
    }

    fn activate(&mut self, ctx: &TickContext, rng: &mut dyn RandomSource) -> Vec<GameEvent> {
        self.register_hit((ctx.width, ctx.height), ctx.timestamp_ms, rng)
    }

    fn restart(&mut self) -> Vec<GameEvent> {
        vec![GameState::restart(self)]
    }

    fn phase(&self) -> SessionPhase {
        if self.is_finished() {
            SessionPhase::Finished
        } else {
            SessionPhase::Playing
        }
    }

    fn progress(&self) -> GameProgress {
        GameProgress {
            completed: self.popped_count,
            explosions: 0,
            finish_time_ms: self.finish_time_ms,
        }
    }

    fn draw(&self, ctx: &TickContext, out: &mut Vec<DrawCommand>) {
        overlay::draw_balloon_game(self, ctx, out);
    }
}
