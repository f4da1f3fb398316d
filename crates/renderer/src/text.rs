//! Text drawing with an embedded font.

use crate::style::Rgba;
use crate::{RenderError, RenderResult};
use image::{Rgba as Pixel, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use precip_common::ForecastWindow;
use rusttype::{Font, Scale};

/// Embedded font data - DejaVu Sans Mono
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// Line spacing as a multiple of the font size.
const LINE_SPACING: f32 = 1.2;

/// Title of a precipitation map, e.g.
/// `Total precipitation from 2024-03-10 12:00:00 to 2024-03-11 12:00:00 (for 24 hours)`.
pub fn map_title(window: &ForecastWindow) -> String {
    format!(
        "Total precipitation from {} to {} (for {} hours)",
        window.valid_from.format("%Y-%m-%d %H:%M:%S"),
        window.valid_to.format("%Y-%m-%d %H:%M:%S"),
        window.horizon_hours
    )
}

pub struct TextRenderer {
    font: Font<'static>,
}

impl TextRenderer {
    pub fn new() -> RenderResult<Self> {
        let font = Font::try_from_bytes(FONT_DATA).ok_or(RenderError::Font)?;
        Ok(Self { font })
    }

    /// `(width, height)` in pixels of one line of text.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        let (w, h) = text_size(Scale::uniform(size), &self.font, text);
        (w.max(0) as u32, h.max(0) as u32)
    }

    /// `(width, height)` of a block of lines.
    pub fn measure_lines(&self, lines: &[String], size: f32) -> (u32, u32) {
        let width = lines
            .iter()
            .map(|line| self.measure(line, size).0)
            .max()
            .unwrap_or(0);
        (width, self.block_height(lines.len(), size))
    }

    pub fn line_height(&self, size: f32) -> u32 {
        (size * LINE_SPACING).ceil() as u32
    }

    fn block_height(&self, lines: usize, size: f32) -> u32 {
        match lines {
            0 => 0,
            n => self.line_height(size) * (n as u32 - 1) + size.ceil() as u32,
        }
    }

    /// Draw one line with its top-left corner at `(x, y)`.
    pub fn draw(&self, image: &mut RgbaImage, text: &str, x: i32, y: i32, size: f32, color: Rgba) {
        draw_text_mut(
            image,
            Pixel(color),
            x,
            y,
            Scale::uniform(size),
            &self.font,
            text,
        );
    }

    /// Draw lines top to bottom starting at `(x, y)`.
    pub fn draw_lines(
        &self,
        image: &mut RgbaImage,
        lines: &[String],
        x: i32,
        y: i32,
        size: f32,
        color: Rgba,
    ) {
        let step = self.line_height(size) as i32;
        for (i, line) in lines.iter().enumerate() {
            self.draw(image, line, x, y + i as i32 * step, size, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_map_title() {
        let issued = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let window = ForecastWindow::new(issued, 24);
        assert_eq!(
            map_title(&window),
            "Total precipitation from 2024-03-10 12:00:00 to 2024-03-11 12:00:00 (for 24 hours)"
        );
    }

    #[test]
    fn test_measure_grows_with_text() {
        let text = TextRenderer::new().unwrap();
        let (short, h) = text.measure("1", 20.0);
        let (long, _) = text.measure("1000", 20.0);
        assert!(long > short);
        assert!(h > 0 && h <= 20);
        assert_eq!(text.measure("", 20.0), (0, 0));
    }

    #[test]
    fn test_draw_marks_pixels() {
        let text = TextRenderer::new().unwrap();
        let mut image = RgbaImage::new(100, 30);
        text.draw(&mut image, "Rain", 2, 2, 20.0, [255, 255, 255, 255]);
        assert!(image.pixels().any(|p| p.0[3] > 0));
    }

    #[test]
    fn test_measure_lines() {
        let text = TextRenderer::new().unwrap();
        let lines = vec!["a".to_string(), "abcdef".to_string()];
        let (w, h) = text.measure_lines(&lines, 10.0);
        assert_eq!(w, text.measure("abcdef", 10.0).0);
        assert_eq!(h, 12 + 10);
    }
}
