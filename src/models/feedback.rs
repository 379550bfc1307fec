// Data models for the spoken feedback queue

use serde::{Deserialize, Serialize};
use std::fmt;

/// An utterance waiting to be spoken. Immutable once queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackMessage {
    text: String,
}

impl FeedbackMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl From<&str> for FeedbackMessage {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for FeedbackMessage {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for FeedbackMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Counters published by the feedback worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub enqueued: u64,
    pub spoken: u64,
    pub dropped: u64,
    pub failed: u64,
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("Feedback queue is full ({capacity} messages), message dropped")]
    QueueSaturation { capacity: usize },

    #[error("Feedback channel is closed")]
    Closed,

    #[error("Failed to start feedback worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

pub type FeedbackResult<T> = Result<T, FeedbackError>;
