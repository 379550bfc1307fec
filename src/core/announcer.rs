// Turns game events into spoken feedback

use crate::core::config::GameConfig;
use crate::core::random::RandomSource;
use crate::models::feedback::FeedbackMessage;
use crate::models::game::GameEvent;

pub const RESTART_UTTERANCE: &str = "Let's start again";

pub struct Announcer {
    motivational: Vec<String>,
    completion: String,
    finish: String,
}

impl Announcer {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            motivational: config.motivational_utterances.clone(),
            completion: config.completion_utterance.clone(),
            finish: config.finish_utterance.clone(),
        }
    }

    /// Utterance for one event, if the event is worth saying out loud
    pub fn announce(&self, event: &GameEvent, rng: &mut dyn RandomSource) -> Option<FeedbackMessage> {
        match event {
            GameEvent::Popped { .. } | GameEvent::Repetition { .. } => self.motivation(rng),
            GameEvent::SessionFinished { elapsed_ms, .. } => Some(FeedbackMessage::new(format!(
                "{}. Duration: {} seconds",
                self.finish,
                elapsed_ms / 1000
            ))),
            GameEvent::ExplosionCleared => Some(FeedbackMessage::new(self.completion.as_str())),
            GameEvent::Restarted => Some(FeedbackMessage::from(RESTART_UTTERANCE)),
            GameEvent::StageAdvanced { .. }
            | GameEvent::Respawned { .. }
            | GameEvent::Exploded { .. } => None,
        }
    }

    fn motivation(&self, rng: &mut dyn RandomSource) -> Option<FeedbackMessage> {
        if self.motivational.is_empty() {
            return None;
        }
        let index = rng.next_index(self.motivational.len());
        Some(FeedbackMessage::new(self.motivational[index].as_str()))
    }
}
