// Speech backends for the feedback worker

use crate::core::config::SpeechConfig;
use crate::platform::{SpeechError, SpeechRenderer, SpeechResult};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info};

/// Build the backend selected in the configuration
pub fn speech_for_config(config: &SpeechConfig) -> Box<dyn SpeechRenderer> {
    match config {
        SpeechConfig::Log { words_per_minute } => Box::new(LogSpeech::new(*words_per_minute)),
        SpeechConfig::Command { program, args } => {
            Box::new(CommandSpeech::new(program.clone(), args.clone()))
        }
    }
}

/// Writes utterances to the log. With a speaking rate it also blocks for as
/// long as saying the words would take.
pub struct LogSpeech {
    words_per_minute: Option<u32>,
}

impl LogSpeech {
    pub fn new(words_per_minute: Option<u32>) -> Self {
        Self { words_per_minute }
    }

    /// Time to say `text` at the configured rate
    pub fn speaking_time(&self, text: &str) -> Duration {
        match self.words_per_minute {
            Some(wpm) if wpm > 0 => {
                let words = text.split_whitespace().count() as u64;
                Duration::from_millis(words * 60_000 / u64::from(wpm))
            }
            _ => Duration::ZERO,
        }
    }
}

impl SpeechRenderer for LogSpeech {
    fn speak(&mut self, text: &str) -> SpeechResult<()> {
        info!(utterance = text, "Speaking");
        let duration = self.speaking_time(text);
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
        Ok(())
    }
}

/// Runs an external TTS program (e.g. `espeak`) with the utterance as its
/// last argument and waits for it to finish
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl SpeechRenderer for CommandSpeech {
    fn speak(&mut self, text: &str) -> SpeechResult<()> {
        debug!(program = %self.program, utterance = text, "Running speech command");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;

        if !status.success() {
            return Err(SpeechError::CommandFailed {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}
