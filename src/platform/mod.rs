// Collaborator contracts: where frames come from, where overlays go and how
// utterances are vocalized. Concrete adapters live in the submodules.

use crate::models::pose::CapturedFrame;
use crate::models::render::{DrawCommand, RenderResult};
use thiserror::Error;

pub mod pose;
pub mod render;
pub mod speech;

pub use pose::{CurlSimulator, ReplaySource};
pub use render::{ImageSurface, RecordingSurface};
pub use speech::{speech_for_config, CommandSpeech, LogSpeech};

/// Produces one captured frame per tick
pub trait PoseSource {
    /// Next frame, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Option<CapturedFrame>;
}

/// Frame buffer owned by the surrounding application
pub trait RenderSurface {
    /// Start a new frame; fails for sizes the surface cannot hold
    fn begin_frame(&mut self, width: u32, height: u32) -> RenderResult<()>;

    fn draw(&mut self, command: &DrawCommand);

    /// Flush the frame
    fn present(&mut self) -> RenderResult<()>;
}

/// Synchronous text-to-speech. Only the feedback worker calls this.
pub trait SpeechRenderer: Send + 'static {
    fn speak(&mut self, text: &str) -> SpeechResult<()>;
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech program {program} exited with {status}")]
    CommandFailed { program: String, status: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpeechResult<T> = Result<T, SpeechError>;
