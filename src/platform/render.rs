// Render surfaces: an RGB frame buffer that can dump PNGs, and a recorder
// that keeps the draw commands of every presented frame.

use crate::models::game::{Rgb, TargetRect};
use crate::models::pose::{is_valid_frame_size, Point2D};
use crate::models::render::{DrawCommand, RenderError, RenderResult};
use crate::platform::RenderSurface;
use image::{ImageFormat, RgbImage};
use std::path::{Path, PathBuf};
use tracing::debug;

// ==============================================================================
// Image Frame Buffer
// ==============================================================================

/// Rasterizes overlays into an `RgbImage`. Text cannot be rasterized without
/// a font, so text commands are kept as captions of the current frame.
pub struct ImageSurface {
    buffer: RgbImage,
    captions: Vec<String>,
    output_dir: Option<PathBuf>,
    presented: u64,
}

impl ImageSurface {
    pub fn new() -> Self {
        Self {
            buffer: RgbImage::new(0, 0),
            captions: Vec::new(),
            output_dir: None,
            presented: 0,
        }
    }

    /// Write every presented frame as `frame_000001.png`, ... into `dir`
    pub fn with_output_dir(dir: &Path) -> RenderResult<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            output_dir: Some(dir.to_path_buf()),
            ..Self::new()
        })
    }

    pub fn buffer(&self) -> &RgbImage {
        &self.buffer
    }

    pub fn captions(&self) -> &[String] {
        &self.captions
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= i64::from(self.buffer.width()) || y >= i64::from(self.buffer.height()) {
            return;
        }
        self.buffer
            .put_pixel(x as u32, y as u32, image::Rgb([color.0, color.1, color.2]));
    }

    fn fill_rect(&mut self, rect: &TargetRect, color: Rgb, filled: bool) {
        let (x0, y0) = (rect.x0.floor() as i64, rect.y0.floor() as i64);
        let (x1, y1) = (rect.x1.ceil() as i64, rect.y1.ceil() as i64);
        for y in y0..y1 {
            for x in x0..x1 {
                let edge = x == x0 || y == y0 || x == x1 - 1 || y == y1 - 1;
                if filled || edge {
                    self.put(x, y, color);
                }
            }
        }
    }

    fn circle(&mut self, center: Point2D, radius: f32, color: Rgb, filled: bool) {
        let r = radius.max(0.0);
        let (cx, cy) = (center.x, center.y);
        let (min_x, max_x) = ((cx - r).floor() as i64, (cx + r).ceil() as i64);
        let (min_y, max_y) = ((cy - r).floor() as i64, (cy + r).ceil() as i64);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let d = Point2D::new(x as f32, y as f32).distance_to(center);
                let inside = if filled { d <= r } else { (d - r).abs() <= 0.5 };
                if inside {
                    self.put(x, y, color);
                }
            }
        }
    }

    fn line(&mut self, from: Point2D, to: Point2D, color: Rgb) {
        let steps = from.distance_to(to).ceil().max(1.0) as i64;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = from.x + (to.x - from.x) * t;
            let y = from.y + (to.y - from.y) * t;
            self.put(x.round() as i64, y.round() as i64, color);
        }
    }
}

impl Default for ImageSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for ImageSurface {
    fn begin_frame(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if !is_valid_frame_size(width, height) {
            return Err(RenderError::FrameSize { width, height });
        }
        if self.buffer.width() != width || self.buffer.height() != height {
            self.buffer = RgbImage::new(width, height);
        } else {
            self.buffer.pixels_mut().for_each(|p| *p = image::Rgb([0, 0, 0]));
        }
        self.captions.clear();
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::Rect { rect, color, filled } => self.fill_rect(rect, *color, *filled),
            DrawCommand::Circle {
                center,
                radius,
                color,
                filled,
            } => self.circle(*center, *radius, *color, *filled),
            DrawCommand::Line { from, to, color } => self.line(*from, *to, *color),
            DrawCommand::Text { text, .. } => self.captions.push(text.clone()),
        }
    }

    fn present(&mut self) -> RenderResult<()> {
        self.presented += 1;
        if let Some(dir) = &self.output_dir {
            let path = dir.join(format!("frame_{:06}.png", self.presented));
            self.buffer.save_with_format(&path, ImageFormat::Png)?;
            debug!(path = %path.display(), captions = ?self.captions, "Frame written");
        }
        Ok(())
    }
}

// ==============================================================================
// Recorder
// ==============================================================================

/// Keeps every presented frame's commands
#[derive(Debug, Default)]
pub struct RecordingSurface {
    current: Vec<DrawCommand>,
    frames: Vec<Vec<DrawCommand>>,
    frame_size: (u32, u32),
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Vec<DrawCommand>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[DrawCommand]> {
        self.frames.last().map(Vec::as_slice)
    }

    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    /// Text of every caption in the last presented frame
    pub fn last_texts(&self) -> Vec<&str> {
        self.last_frame()
            .map(|frame| frame.iter().filter_map(DrawCommand::as_text).collect())
            .unwrap_or_default()
    }
}

impl RenderSurface for RecordingSurface {
    fn begin_frame(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.current.clear();
        self.frame_size = (width, height);
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) {
        self.current.push(command.clone());
    }

    fn present(&mut self) -> RenderResult<()> {
        self.frames.push(std::mem::take(&mut self.current));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_outline_and_fill() {
        let mut surface = ImageSurface::new();
        surface.begin_frame(20, 20).unwrap();
        surface.draw(&DrawCommand::Rect {
            rect: TargetRect::new(2.0, 2.0, 8.0, 8.0),
            color: Rgb::RED,
            filled: false,
        });
        let red = image::Rgb([230, 30, 30]);
        assert_eq!(*surface.buffer().get_pixel(2, 2), red);
        assert_eq!(*surface.buffer().get_pixel(7, 5), red);
        assert_eq!(*surface.buffer().get_pixel(5, 5), image::Rgb([0, 0, 0]));
        // Half-open: column 8 is outside
        assert_eq!(*surface.buffer().get_pixel(8, 5), image::Rgb([0, 0, 0]));
    }

    #[test]
    fn test_shapes_clip_at_frame_edges() {
        let mut surface = ImageSurface::new();
        surface.begin_frame(10, 10).unwrap();
        surface.draw(&DrawCommand::Circle {
            center: Point2D::new(0.0, 0.0),
            radius: 5.0,
            color: Rgb::BLUE,
            filled: true,
        });
        surface.draw(&DrawCommand::Line {
            from: Point2D::new(-5.0, 5.0),
            to: Point2D::new(50.0, 5.0),
            color: Rgb::GREEN,
        });
        assert_eq!(*surface.buffer().get_pixel(0, 0), image::Rgb([30, 90, 255]));
        assert_eq!(*surface.buffer().get_pixel(9, 5), image::Rgb([0, 200, 0]));
    }

    #[test]
    fn test_text_becomes_caption_and_resets_per_frame() {
        let mut surface = ImageSurface::new();
        surface.begin_frame(10, 10).unwrap();
        surface.draw(&DrawCommand::text(0.0, 0.0, "Stage 1/5"));
        assert_eq!(surface.captions(), ["Stage 1/5".to_string()]);
        surface.present().unwrap();

        surface.begin_frame(10, 10).unwrap();
        assert!(surface.captions().is_empty());
    }

    #[test]
    fn test_oversized_frame_rejected_without_touching_buffer() {
        let mut surface = ImageSurface::new();
        surface.begin_frame(32, 24).unwrap();
        surface.draw(&DrawCommand::text(0.0, 0.0, "Stage 1/5"));

        let err = surface.begin_frame(u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(
            err,
            RenderError::FrameSize { width: u32::MAX, height: u32::MAX }
        ));
        assert!(surface.begin_frame(0, 480).is_err());
        assert_eq!((surface.buffer().width(), surface.buffer().height()), (32, 24));
        assert_eq!(surface.captions().len(), 1);
    }

    #[test]
    fn test_png_written_per_presented_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = ImageSurface::with_output_dir(dir.path()).unwrap();
        for _ in 0..2 {
            surface.begin_frame(16, 12).unwrap();
            surface.present().unwrap();
        }
        assert!(dir.path().join("frame_000001.png").exists());
        assert!(dir.path().join("frame_000002.png").exists());

        let decoded = image::open(dir.path().join("frame_000002.png")).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 12));
    }

    #[test]
    fn test_recording_surface_keeps_frames() {
        let mut surface = RecordingSurface::new();
        surface.begin_frame(640, 480).unwrap();
        surface.draw(&DrawCommand::text(0.0, 0.0, "Popped 1/10"));
        surface.present().unwrap();
        surface.begin_frame(640, 480).unwrap();
        surface.present().unwrap();

        assert_eq!(surface.frames().len(), 2);
        assert_eq!(surface.frames()[0].len(), 1);
        assert!(surface.last_texts().is_empty());
        assert_eq!(surface.frame_size(), (640, 480));
    }
}
