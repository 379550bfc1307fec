use crate::models::game::{Limb, Quadrant};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn invalid<T>(message: impl Into<String>) -> ConfigResult<T> {
    Err(ConfigError::InvalidConfiguration(message.into()))
}

/// Which game runs on top of the shared session loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Pop balloons by touching them with the requested limb
    Balloon,
    /// Inflate a balloon with elbow flexion/extension repetitions
    Elbow,
}

/// How a persisting hit advances the balloon stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageAdvance {
    /// Every tick the point stays inside advances one stage
    Level,
    /// One stage per entry into the hit-box
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Which decision change counts as one repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepetitionEdge {
    ExtensionToFlexion,
    FlexionToExtension,
}

/// Elbow-variant balloon growth and explosion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationConfig {
    /// Balloon diameter in pixels before the first repetition
    pub initial_size: f32,
    /// Diameter added per repetition
    pub size_increment: f32,
    /// Ticks the explosion animation lasts before the balloon resets
    pub explosion_tick_budget: u32,
    /// Fragments spawned per explosion
    pub fragment_count: usize,
}

impl Default for InflationConfig {
    fn default() -> Self {
        Self {
            initial_size: 50.0,
            size_increment: 10.0,
            explosion_tick_budget: 30,
            fragment_count: 40,
        }
    }
}

/// Camera distance heuristic calibration and the comfortable range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceConfig {
    /// Normalized shoulder span measured at `reference_distance_m`
    pub reference_shoulder_span: f32,
    pub reference_distance_m: f32,
    pub min_distance_m: f32,
    pub max_distance_m: f32,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            reference_shoulder_span: 0.25,
            reference_distance_m: 2.0,
            min_distance_m: 1.5,
            max_distance_m: 2.5,
        }
    }
}

/// Spoken feedback queue tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// `None` keeps the queue unbounded; `Some(n)` drops new messages once `n` are waiting
    pub queue_capacity: Option<usize>,
    pub poll_timeout_ms: u64,
    pub idle_sleep_ms: u64,
    /// How long shutdown keeps speaking queued messages before dropping the rest
    pub drain_timeout_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            queue_capacity: None,
            poll_timeout_ms: 1000,
            idle_sleep_ms: 250,
            drain_timeout_ms: 2000,
        }
    }
}

/// Speech backend used by the feedback worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum SpeechConfig {
    /// Write utterances to the log, optionally pausing as if speaking
    Log { words_per_minute: Option<u32> },
    /// Run an external text-to-speech program with the utterance as last argument
    Command { program: String, args: Vec<String> },
}

impl Default for SpeechConfig {
    fn default() -> Self {
        SpeechConfig::Log {
            words_per_minute: None,
        }
    }
}

/// Game configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub variant: Variant,
    /// Pops needed to finish a balloon session
    pub session_target_pops: u32,
    /// Highest stage; a hit at this stage pops the balloon
    pub balloon_stage_count: u8,
    /// Balloon hit-box edge length in pixels
    pub balloon_size_px: u32,
    /// Top-left corner of the first balloon
    pub initial_location: (u32, u32),
    pub initial_limb_index: usize,
    /// Limbs the game cycles through; never repeats the same index twice in a row
    pub limb_set: Vec<Limb>,
    pub quadrant_map: BTreeMap<Limb, Quadrant>,
    pub stage_advance: StageAdvance,
    /// Joints below this visibility are treated as missing (0.0-1.0)
    pub min_landmark_visibility: f32,
    /// Repetitions before the elbow balloon explodes
    pub max_repetition_transitions: u32,
    /// Smoothed elbow angle (degrees) below which the arm counts as flexed
    pub flex_threshold: f32,
    /// Smoothed elbow angle (degrees) above which the arm counts as extended
    pub extend_threshold: f32,
    pub moving_average_window: usize,
    pub monitored_arm: Side,
    pub repetition_edge: RepetitionEdge,
    pub inflation: InflationConfig,
    pub distance: DistanceConfig,
    pub motivational_utterances: Vec<String>,
    pub completion_utterance: String,
    pub finish_utterance: String,
    pub feedback: FeedbackConfig,
    pub speech: SpeechConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut quadrant_map = BTreeMap::new();
        quadrant_map.insert(Limb::LeftHand, Quadrant::TopLeft);
        quadrant_map.insert(Limb::LeftKnee, Quadrant::BottomLeft);
        quadrant_map.insert(Limb::RightHand, Quadrant::TopRight);
        quadrant_map.insert(Limb::RightKnee, Quadrant::BottomRight);

        Self {
            variant: Variant::Balloon,
            session_target_pops: 10,
            balloon_stage_count: 5,
            balloon_size_px: 100,
            initial_location: (500, 100),
            initial_limb_index: 0,
            limb_set: vec![Limb::LeftHand, Limb::LeftKnee, Limb::RightHand, Limb::RightKnee],
            quadrant_map,
            stage_advance: StageAdvance::Level,
            min_landmark_visibility: 0.5,
            max_repetition_transitions: 10,
            flex_threshold: 70.0,
            extend_threshold: 150.0,
            moving_average_window: 10,
            monitored_arm: Side::Left,
            repetition_edge: RepetitionEdge::ExtensionToFlexion,
            inflation: InflationConfig::default(),
            distance: DistanceConfig::default(),
            motivational_utterances: vec![
                "keep on going".to_string(),
                "you are doing great. I see it".to_string(),
                "only a few left".to_string(),
                "that is awesome".to_string(),
                "you have almost finished the exercise".to_string(),
            ],
            completion_utterance: "Boom! Balloon complete, let's do another one".to_string(),
            finish_utterance: "You have finished the exercise".to_string(),
            feedback: FeedbackConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

impl GameConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to validated defaults
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values. This is the only place that produces
    /// `InvalidConfiguration`; the session loop refuses to start without it.
    pub fn validate(&self) -> ConfigResult<()> {
        // Limb set: the respawn draw excludes the current index, so it needs two entries
        if self.limb_set.len() < 2 {
            return invalid(format!(
                "limb_set needs at least 2 limbs, got {}",
                self.limb_set.len()
            ));
        }

        let mut seen = HashSet::new();
        for limb in &self.limb_set {
            if !seen.insert(limb) {
                return invalid(format!("limb_set contains {} more than once", limb));
            }
            if !self.quadrant_map.contains_key(limb) {
                return invalid(format!("quadrant_map has no region for {}", limb));
            }
        }

        if self.initial_limb_index >= self.limb_set.len() {
            return invalid(format!(
                "initial_limb_index {} is outside limb_set (len {})",
                self.initial_limb_index,
                self.limb_set.len()
            ));
        }

        if self.session_target_pops == 0 {
            return invalid("session_target_pops must be at least 1");
        }

        if self.balloon_stage_count == 0 {
            return invalid("balloon_stage_count must be at least 1");
        }

        if self.balloon_size_px == 0 {
            return invalid("balloon_size_px must be at least 1");
        }

        if !(0.0..=1.0).contains(&self.min_landmark_visibility) {
            return invalid(format!(
                "min_landmark_visibility {} must be between 0.0 and 1.0",
                self.min_landmark_visibility
            ));
        }

        // Angle classifier
        if self.max_repetition_transitions == 0 {
            return invalid("max_repetition_transitions must be at least 1");
        }

        if self.moving_average_window == 0 {
            return invalid("moving_average_window must be at least 1");
        }

        for (name, value) in [
            ("flex_threshold", self.flex_threshold),
            ("extend_threshold", self.extend_threshold),
        ] {
            if !(0.0..=180.0).contains(&value) {
                return invalid(format!("{} {} must be between 0 and 180 degrees", name, value));
            }
        }

        if self.flex_threshold >= self.extend_threshold {
            return invalid(format!(
                "flex_threshold ({}) must be below extend_threshold ({})",
                self.flex_threshold, self.extend_threshold
            ));
        }

        // Inflation
        if self.inflation.initial_size <= 0.0 || self.inflation.size_increment < 0.0 {
            return invalid("inflation sizes must be positive");
        }

        if self.inflation.explosion_tick_budget == 0 {
            return invalid("inflation.explosion_tick_budget must be at least 1");
        }

        // Distance heuristic
        let distance = &self.distance;
        if distance.reference_shoulder_span <= 0.0 || distance.reference_distance_m <= 0.0 {
            return invalid("distance calibration values must be positive");
        }

        if distance.min_distance_m >= distance.max_distance_m {
            return invalid(format!(
                "distance band is inverted: {} >= {}",
                distance.min_distance_m, distance.max_distance_m
            ));
        }

        // Utterances
        if self.motivational_utterances.is_empty() {
            return invalid("motivational_utterances cannot be empty");
        }

        if self.completion_utterance.trim().is_empty() || self.finish_utterance.trim().is_empty() {
            return invalid("completion and finish utterances cannot be empty");
        }

        // Feedback queue
        if self.feedback.queue_capacity == Some(0) {
            return invalid("feedback.queue_capacity must be at least 1 when set");
        }

        if self.feedback.poll_timeout_ms == 0 {
            return invalid("feedback.poll_timeout_ms must be at least 1");
        }

        if let SpeechConfig::Command { program, .. } = &self.speech {
            if program.trim().is_empty() {
                return invalid("speech command program cannot be empty");
            }
        }

        Ok(())
    }

    /// Quadrant assigned to a limb; validation guarantees every configured limb has one
    pub fn quadrant_for(&self, limb: Limb) -> Quadrant {
        self.quadrant_map
            .get(&limb)
            .copied()
            .unwrap_or(Quadrant::TopLeft)
    }

    /// Get the default configuration file path
    pub fn default_path() -> ConfigResult<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| {
                ConfigError::InvalidConfiguration("Could not determine home directory".to_string())
            })?;

        let mut path = PathBuf::from(home);
        path.push(".coach");
        path.push("config.json");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(config: &GameConfig) {
        match config.validate() {
            Err(ConfigError::InvalidConfiguration(_)) => {}
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.session_target_pops, 10);
        assert_eq!(config.balloon_stage_count, 5);
        assert_eq!(config.initial_location, (500, 100));
        assert_eq!(config.limb_set.len(), 4);
        assert_eq!(config.stage_advance, StageAdvance::Level);
        assert_eq!(config.moving_average_window, 10);
        assert_eq!(config.feedback.queue_capacity, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GameConfig::default();

        // Limb set too small
        config.limb_set = vec![Limb::LeftHand];
        config.initial_limb_index = 0;
        assert_invalid(&config);
        config = GameConfig::default();

        // Duplicate limb
        config.limb_set = vec![Limb::LeftHand, Limb::LeftHand];
        assert_invalid(&config);
        config = GameConfig::default();

        // Limb without a quadrant
        config.quadrant_map.remove(&Limb::RightKnee);
        assert_invalid(&config);
        config = GameConfig::default();

        // Inverted thresholds
        config.flex_threshold = 160.0;
        assert_invalid(&config);
        config.flex_threshold = 150.0;
        assert_invalid(&config);
        config = GameConfig::default();

        // Zero window
        config.moving_average_window = 0;
        assert_invalid(&config);
        config = GameConfig::default();

        // Zero queue capacity
        config.feedback.queue_capacity = Some(0);
        assert_invalid(&config);
        config.feedback.queue_capacity = Some(8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = GameConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{"variant": "elbow", "session_target_pops": 3, "speech": {"backend": "command", "program": "espeak", "args": ["-s", "150"]}}"#;
        let config: GameConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.variant, Variant::Elbow);
        assert_eq!(config.session_target_pops, 3);
        assert_eq!(config.balloon_stage_count, 5);
        assert!(matches!(config.speech, SpeechConfig::Command { ref program, .. } if program == "espeak"));
    }

    #[test]
    fn test_save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = GameConfig::default();
        config.session_target_pops = 4;
        config.save(&path).unwrap();

        let loaded = GameConfig::load(&path).unwrap();
        assert_eq!(loaded.session_target_pops, 4);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"limb_set": ["left_hand"]}"#).unwrap();

        assert!(matches!(
            GameConfig::load(&path),
            Err(ConfigError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = GameConfig::load_or_default(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config, GameConfig::default());
    }
}
