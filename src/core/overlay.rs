// Overlay builder: turns the pose and the game state into draw commands

use crate::core::exercise::{ExerciseGame, TickContext};
use crate::core::game_state::GameState;
use crate::core::inflation::{balloon_center, InflationGame};
use crate::core::pose_metrics::{DistanceBand, PoseMetrics};
use crate::models::game::Rgb;
use crate::models::pose::{BodyLandmark, Point2D, SKELETON_CONNECTIONS};
use crate::models::render::DrawCommand;

const JOINT_RADIUS: f32 = 4.0;
const LINE_HEIGHT: f32 = 30.0;
const MARGIN: f32 = 10.0;

/// Accumulates one frame's overlay in draw order
#[derive(Debug, Default)]
pub struct OverlayBuilder {
    commands: Vec<DrawCommand>,
}

impl OverlayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bones between visible joints plus a dot on each joint
    pub fn skeleton(&mut self, metrics: &PoseMetrics<'_>) -> &mut Self {
        for (from, to) in SKELETON_CONNECTIONS {
            if let (Ok(a), Ok(b)) = (metrics.joint_position(from), metrics.joint_position(to)) {
                self.commands.push(DrawCommand::Line {
                    from: a,
                    to: b,
                    color: Rgb::WHITE,
                });
            }
        }

        for landmark in BodyLandmark::ALL {
            if !is_skeleton_joint(landmark) {
                continue;
            }
            if let Ok(center) = metrics.joint_position(landmark) {
                self.commands.push(DrawCommand::Circle {
                    center,
                    radius: JOINT_RADIUS,
                    color: Rgb::ORANGE,
                    filled: true,
                });
            }
        }
        self
    }

    /// Game-specific layer
    pub fn game(&mut self, game: &dyn ExerciseGame, ctx: &TickContext) -> &mut Self {
        game.draw(ctx, &mut self.commands);
        self
    }

    /// Distance hint along the bottom edge
    pub fn distance_hint(&mut self, band: DistanceBand, ctx: &TickContext) -> &mut Self {
        self.commands.push(DrawCommand::Text {
            origin: bottom_line(ctx, 0),
            text: band.hint().to_string(),
            color: match band {
                DistanceBand::InRange => Rgb::GREEN,
                DistanceBand::TooClose | DistanceBand::TooFar => Rgb::RED,
            },
        });
        self
    }

    /// Free-form status line above the distance hint
    pub fn status(&mut self, text: impl Into<String>, ctx: &TickContext) -> &mut Self {
        self.commands.push(DrawCommand::Text {
            origin: bottom_line(ctx, 1),
            text: text.into(),
            color: Rgb::WHITE,
        });
        self
    }

    pub fn build(self) -> Vec<DrawCommand> {
        self.commands
    }
}

fn is_skeleton_joint(landmark: BodyLandmark) -> bool {
    SKELETON_CONNECTIONS
        .iter()
        .any(|(a, b)| *a == landmark || *b == landmark)
}

fn top_line(line: usize) -> (f32, f32) {
    (MARGIN, LINE_HEIGHT * (line as f32 + 1.0))
}

fn bottom_line(ctx: &TickContext, from_bottom: usize) -> Point2D {
    Point2D::new(
        MARGIN,
        ctx.height as f32 - MARGIN - LINE_HEIGHT * from_bottom as f32,
    )
}

/// Balloon game: hit-box in the limb's colour with a balloon growing per stage
pub fn draw_balloon_game(state: &GameState, ctx: &TickContext, out: &mut Vec<DrawCommand>) {
    let elapsed_s = state.elapsed_ms(ctx.timestamp_ms) / 1000;

    if state.is_finished() {
        let (x, y) = top_line(0);
        out.push(DrawCommand::Text {
            origin: Point2D::new(x, y),
            text: format!(
                "Finished! {} balloons in {} seconds",
                state.popped_count(),
                elapsed_s
            ),
            color: Rgb::GREEN,
        });
        return;
    }

    let limb = state.active_limb();
    let rect = state.target_rect();
    let stage = state.target().stage;
    let fill = 0.4 + 0.6 * f32::from(stage) / f32::from(state.stage_count());

    out.push(DrawCommand::Rect {
        rect,
        color: limb.color(),
        filled: false,
    });
    out.push(DrawCommand::Circle {
        center: rect.center(),
        radius: rect.width() / 2.0 * fill,
        color: limb.color(),
        filled: true,
    });

    let lines = [
        format!("Use your {}", limb.as_str().replace('_', " ")),
        format!("Stage {}/{}", stage, state.stage_count()),
        format!("Popped {}/{}", state.popped_count(), state.session_target()),
        format!("Duration: {} seconds", elapsed_s),
    ];
    for (line, text) in lines.into_iter().enumerate() {
        let (x, y) = top_line(line);
        out.push(DrawCommand::text(x, y, text));
    }
}

/// Elbow game: inflating circle mid-frame, or the flying fragments
pub fn draw_inflation_game(game: &InflationGame, ctx: &TickContext, out: &mut Vec<DrawCommand>) {
    if game.is_exploding() {
        for fragment in game.fragments() {
            out.push(DrawCommand::Circle {
                center: fragment.position,
                radius: fragment.size / 2.0,
                color: fragment.color,
                filled: true,
            });
        }
    } else {
        out.push(DrawCommand::Circle {
            center: balloon_center(ctx),
            radius: game.size() / 2.0,
            color: Rgb::RED,
            filled: true,
        });
    }

    let (x, y) = top_line(0);
    out.push(DrawCommand::text(
        x,
        y,
        format!("Repetitions: {}/{}", game.repetitions(), game.max_transitions()),
    ));
    let (x, y) = top_line(1);
    out.push(DrawCommand::text(x, y, format!("Balloons: {}", game.explosions())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GameConfig;
    use crate::core::random::ScriptedRandom;
    use crate::models::pose::{Keypoint3D, PoseFrame};

    const CTX: TickContext = TickContext {
        timestamp_ms: 12_500,
        width: 640,
        height: 480,
    };

    fn texts(commands: &[DrawCommand]) -> Vec<&str> {
        commands.iter().filter_map(DrawCommand::as_text).collect()
    }

    #[test]
    fn test_skeleton_skips_missing_joints() {
        let kp = |x, y| Keypoint3D::new(x, y, 0.0, 1.0);
        let frame = PoseFrame::new(0)
            .with_joint(BodyLandmark::LeftShoulder, kp(0.4, 0.3))
            .with_joint(BodyLandmark::LeftElbow, kp(0.4, 0.5))
            .with_joint(BodyLandmark::LeftWrist, Keypoint3D::new(0.4, 0.7, 0.0, 0.1))
            .with_joint(BodyLandmark::Nose, kp(0.5, 0.1));
        let metrics = PoseMetrics::new(&frame, 640, 480, 0.5);

        let mut builder = OverlayBuilder::new();
        builder.skeleton(&metrics);
        let commands = builder.build();

        let lines = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count();
        let joints = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
            .count();
        // Shoulder-elbow only; the wrist is below visibility and the nose is not a skeleton joint
        assert_eq!(lines, 1);
        assert_eq!(joints, 2);
    }

    #[test]
    fn test_balloon_overlay_shows_progress() {
        let mut state = GameState::new(&GameConfig::default()).unwrap();
        let mut rng = ScriptedRandom::new(vec![0]);
        state.begin(2_000);
        state.register_hit((640, 480), 2_000, &mut rng);

        let mut out = Vec::new();
        draw_balloon_game(&state, &CTX, &mut out);

        assert!(matches!(
            out[0],
            DrawCommand::Rect { color: Rgb::GREEN, filled: false, .. }
        ));
        assert_eq!(
            texts(&out),
            vec!["Use your left hand", "Stage 1/5", "Popped 0/10", "Duration: 10 seconds"]
        );
    }

    #[test]
    fn test_inflation_overlay_counts_repetitions() {
        let mut game = InflationGame::new(&GameConfig::default()).unwrap();
        let mut rng = ScriptedRandom::new(vec![0]);
        game.activate(&CTX, &mut rng);

        let mut builder = OverlayBuilder::new();
        builder.game(&game, &CTX).status("FLEXION (45 deg)", &CTX);
        let commands = builder.build();

        assert!(matches!(
            commands[0],
            DrawCommand::Circle { radius, .. } if (radius - 30.0).abs() < 1e-4
        ));
        assert_eq!(
            texts(&commands),
            vec!["Repetitions: 1/10", "Balloons: 0", "FLEXION (45 deg)"]
        );
    }

    #[test]
    fn test_distance_hint_colour() {
        let mut builder = OverlayBuilder::new();
        builder.distance_hint(DistanceBand::TooFar, &CTX);
        let commands = builder.build();
        assert!(matches!(commands[0], DrawCommand::Text { color: Rgb::RED, .. }));
    }
}
