// Shared contract between the session loop and the exercise games

use crate::core::config::{ConfigResult, GameConfig, Variant};
use crate::core::game_state::GameState;
use crate::core::inflation::InflationGame;
use crate::core::random::RandomSource;
use crate::models::game::{GameEvent, Limb, SessionPhase, TargetRect};
use crate::models::render::DrawCommand;

/// Per-tick frame facts handed to the games
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub timestamp_ms: i64,
    pub width: u32,
    pub height: u32,
}

/// What a geometric trigger should hit-test this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerTarget {
    /// Changes whenever a new balloon spawns, even at the same place
    pub target_id: u64,
    pub limb: Limb,
    pub rect: TargetRect,
}

/// Running totals reported in the session summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameProgress {
    /// Balloons popped (balloon game) or repetitions counted (elbow game)
    pub completed: u32,
    pub explosions: u32,
    pub finish_time_ms: Option<i64>,
}

/// A balloon game driven by activations from an `ActivationTrigger`.
///
/// Games are only touched from the frame loop thread.
pub trait ExerciseGame: Send {
    fn name(&self) -> &'static str;

    /// Called once per frame before trigger evaluation, with or without a detection
    fn begin_tick(&mut self, ctx: &TickContext, rng: &mut dyn RandomSource) -> Vec<GameEvent>;

    /// Hit-box for geometric triggers; `None` when the game has nothing to touch
    fn hit_target(&self) -> Option<TriggerTarget>;

    /// Whether an activation this tick would change anything
    fn accepts_activation(&self) -> bool;

    /// Apply one confirmed activation
    fn activate(&mut self, ctx: &TickContext, rng: &mut dyn RandomSource) -> Vec<GameEvent>;

    /// Explicit restart event: back to initial values
    fn restart(&mut self) -> Vec<GameEvent>;

    fn phase(&self) -> SessionPhase;

    fn progress(&self) -> GameProgress;

    /// Append this game's overlay for the current state
    fn draw(&self, ctx: &TickContext, out: &mut Vec<DrawCommand>);
}

/// Build the game matching the configured variant
pub fn game_for_config(config: &GameConfig) -> ConfigResult<Box<dyn ExerciseGame>> {
    match config.variant {
        Variant::Balloon => Ok(Box::new(GameState::new(config)?)),
        Variant::Elbow => Ok(Box::new(InflationGame::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_for_config_picks_variant() {
        let mut config = GameConfig::default();
        assert_eq!(game_for_config(&config).unwrap().name(), "balloon");

        config.variant = Variant::Elbow;
        let game = game_for_config(&config).unwrap();
        assert_eq!(game.name(), "elbow");
        assert!(game.hit_target().is_none());
    }

    #[test]
    fn test_invalid_config_builds_no_game() {
        let mut config = GameConfig::default();
        config.flex_threshold = 160.0;
        assert!(game_for_config(&config).is_err());
    }
}
