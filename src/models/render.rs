// Draw commands handed to the render surface

use crate::models::game::{Rgb, TargetRect};
use crate::models::pose::Point2D;

/// A single overlay primitive in frame pixel space
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        rect: TargetRect,
        color: Rgb,
        filled: bool,
    },
    Circle {
        center: Point2D,
        radius: f32,
        color: Rgb,
        filled: bool,
    },
    Line {
        from: Point2D,
        to: Point2D,
        color: Rgb,
    },
    Text {
        origin: Point2D,
        text: String,
        color: Rgb,
    },
}

impl DrawCommand {
    pub fn text(x: f32, y: f32, text: impl Into<String>) -> Self {
        DrawCommand::Text {
            origin: Point2D::new(x, y),
            text: text.into(),
            color: Rgb::WHITE,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DrawCommand::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Unsupported frame size {width}x{height}")]
    FrameSize { width: u32, height: u32 },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
