// Elbow-variant game: each repetition inflates the balloon, the last one
// bursts it into fragments that fly apart for a fixed number of ticks.

use crate::core::config::{ConfigResult, GameConfig, InflationConfig};
use crate::core::exercise::{ExerciseGame, GameProgress, TickContext, TriggerTarget};
use crate::core::overlay;
use crate::core::random::RandomSource;
use crate::models::game::{ExplosionFragment, GameEvent, Rgb, SessionPhase};
use crate::models::pose::Point2D;
use crate::models::render::DrawCommand;
use std::f32::consts::TAU;
use tracing::{debug, info};

const FRAGMENT_PALETTE: [Rgb; 5] = [Rgb::RED, Rgb::ORANGE, Rgb::YELLOW, Rgb::GREEN, Rgb::BLUE];
const FRAGMENT_MIN_SPEED: f32 = 4.0;
const FRAGMENT_SPEED_SPREAD: f32 = 8.0;
const FRAGMENT_MIN_SIZE: f32 = 3.0;
const FRAGMENT_SIZE_SPREAD: f32 = 5.0;

pub struct InflationGame {
    settings: InflationConfig,
    max_transitions: u32,

    repetitions: u32,
    size: f32,
    total_repetitions: u32,
    explosions: u32,
    fragments: Vec<ExplosionFragment>,
    explosion_ticks: u32,
}

impl InflationGame {
    pub fn new(config: &GameConfig) -> ConfigResult<Self> {
        config.validate()?;

        Ok(Self {
            settings: config.inflation.clone(),
            max_transitions: config.max_repetition_transitions,
            repetitions: 0,
            size: config.inflation.initial_size,
            total_repetitions: 0,
            explosions: 0,
            fragments: Vec::new(),
            explosion_ticks: 0,
        })
    }

    /// Repetitions since the last explosion
    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    pub fn max_transitions(&self) -> u32 {
        self.max_transitions
    }

    /// Current balloon diameter in pixels
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn is_exploding(&self) -> bool {
        !self.fragments.is_empty() || self.explosion_ticks > 0
    }

    pub fn fragments(&self) -> &[ExplosionFragment] {
        &self.fragments
    }

    pub fn explosions(&self) -> u32 {
        self.explosions
    }

    /// Register one completed repetition.
    ///
    /// Below the ceiling the balloon grows by the configured increment. The
    /// repetition that reaches the ceiling explodes the balloon instead.
    /// Repetitions during an explosion are ignored.
    pub fn handle_balloon_inflation(
        &mut self,
        ctx: &TickContext,
        rng: &mut dyn RandomSource,
    ) -> Vec<GameEvent> {
        if self.is_exploding() {
            debug!("Repetition ignored while the balloon is exploding");
            return Vec::new();
        }

        self.repetitions += 1;
        self.total_repetitions += 1;

        if self.repetitions >= self.max_transitions {
            self.explode(ctx, rng);
            return vec![GameEvent::Exploded {
                repetitions: self.repetitions,
            }];
        }

        self.size += self.settings.size_increment;
        debug!(repetitions = self.repetitions, size = self.size, "Balloon inflated");
        vec![GameEvent::Repetition {
            count: self.repetitions,
            size: self.size,
        }]
    }

    fn explode(&mut self, ctx: &TickContext, rng: &mut dyn RandomSource) {
        let center = balloon_center(ctx);
        self.fragments = (0..self.settings.fragment_count)
            .map(|_| {
                let heading = rng.next_unit() * TAU;
                let speed = FRAGMENT_MIN_SPEED + rng.next_unit() * FRAGMENT_SPEED_SPREAD;
                ExplosionFragment {
                    position: center,
                    size: FRAGMENT_MIN_SIZE + rng.next_unit() * FRAGMENT_SIZE_SPREAD,
                    color: FRAGMENT_PALETTE[rng.next_index(FRAGMENT_PALETTE.len())],
                    velocity: Point2D::new(heading.cos() * speed, heading.sin() * speed),
                }
            })
            .collect();
        self.explosion_ticks = self.settings.explosion_tick_budget;
        self.explosions += 1;

        info!(
            repetitions = self.repetitions,
            fragments = self.fragments.len(),
            "Balloon exploded"
        );
    }

    /// Move fragments one step; resets the balloon once the tick budget runs out
    fn advance_explosion(&mut self) -> Option<GameEvent> {
        if !self.is_exploding() {
            return None;
        }

        for fragment in &mut self.fragments {
            fragment.advance();
        }
        self.explosion_ticks = self.explosion_ticks.saturating_sub(1);
        if self.explosion_ticks > 0 {
            return None;
        }

        self.fragments.clear();
        self.repetitions = 0;
        self.size = self.settings.initial_size;
        info!(explosions = self.explosions, "Explosion finished, balloon reset");
        Some(GameEvent::ExplosionCleared)
    }
}

/// The inflating balloon sits in the middle of the frame
pub fn balloon_center(ctx: &TickContext) -> Point2D {
    Point2D::new(ctx.width as f32 / 2.0, ctx.height as f32 / 2.0)
}

impl ExerciseGame for InflationGame {
    fn name(&self) -> &'static str {
        "elbow"
    }

    fn begin_tick(&mut self, _ctx: &TickContext, _rng: &mut dyn RandomSource) -> Vec<GameEvent> {
        self.advance_explosion().into_iter().collect()
    }

    fn hit_target(&self) -> Option<TriggerTarget> {
        None
    }

    fn accepts_activation(&self) -> bool {
        !self.is_exploding()
    }

    fn activate(&mut self, ctx: &TickContext, rng: &mut dyn RandomSource) -> Vec<GameEvent> {
        self.handle_balloon_inflation(ctx, rng)
    }

    fn restart(&mut self) -> Vec<GameEvent> {
        self.repetitions = 0;
        self.total_repetitions = 0;
        self.explosions = 0;
        self.size = self.settings.initial_size;
        self.fragments.clear();
        self.explosion_ticks = 0;
        info!("Inflation session restarted");
        vec![GameEvent::Restarted]
    }

    fn phase(&self) -> SessionPhase {
        if self.is_exploding() {
            SessionPhase::Exploding
        } else {
            SessionPhase::Playing
        }
    }

    fn progress(&self) -> GameProgress {
        GameProgress {
            completed: self.total_repetitions,
            explosions: self.explosions,
            finish_time_ms: None,
        }
    }

    fn draw(&self, ctx: &TickContext, out: &mut Vec<DrawCommand>) {
        overlay::draw_inflation_game(self, ctx, out);
    }
}
