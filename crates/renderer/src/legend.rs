//! Vertical colorbar for a [`ContourScale`].
//!
//! One box per band, equally tall regardless of the level spacing, with a
//! triangle on top for the over color. Tick labels are returned to the
//! caller, which draws text in a separate pass.

use crate::contour::ContourScale;
use crate::style::Rgba;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

/// Height of the over-range triangle relative to the band boxes.
const EXTEND_FRACTION: f32 = 0.05;

/// Placement of a colorbar on the canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorbarGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    /// Total height including the triangle
    pub height: f32,
}

/// A tick mark at a level boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Vertical pixel position of the level
    pub y: f32,
    pub label: String,
}

impl ColorbarGeometry {
    fn triangle_height(&self) -> f32 {
        self.height * EXTEND_FRACTION / (1.0 + EXTEND_FRACTION)
    }

    fn interior_top(&self) -> f32 {
        self.y + self.triangle_height()
    }
}

/// Draw the colorbar and return its ticks, one per level, bottom to top.
pub fn draw_colorbar(
    pixmap: &mut Pixmap,
    scale: &ContourScale,
    geometry: &ColorbarGeometry,
    outline: Rgba,
    outline_width: f32,
) -> Vec<Tick> {
    let colors = scale.band_colors();
    let bottom = geometry.y + geometry.height;
    let top = geometry.interior_top();
    let band_height = (bottom - top) / colors.len() as f32;

    for (i, color) in colors.iter().enumerate() {
        let y = bottom - (i + 1) as f32 * band_height;
        if let Some(rect) = Rect::from_xywh(geometry.x, y, geometry.width, band_height) {
            pixmap.fill_rect(rect, &paint(*color), Transform::identity(), None);
        }
    }

    if let Some(triangle) = triangle_path(geometry) {
        pixmap.fill_path(
            &triangle,
            &paint(scale.over_color()),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    if let Some(frame) = frame_path(geometry) {
        let mut stroke = Stroke::default();
        stroke.width = outline_width.max(0.1);
        pixmap.stroke_path(&frame, &paint(outline), &stroke, Transform::identity(), None);
    }

    ticks(scale, bottom, band_height)
}

fn ticks(scale: &ContourScale, bottom: f32, band_height: f32) -> Vec<Tick> {
    scale
        .levels()
        .iter()
        .enumerate()
        .map(|(i, &level)| Tick {
            y: bottom - i as f32 * band_height,
            label: format_level(level),
        })
        .collect()
}

/// `8` for whole numbers, `2.5` otherwise.
pub fn format_level(level: f32) -> String {
    if level.fract().abs() < 1e-6 {
        format!("{:.0}", level)
    } else {
        format!("{}", level)
    }
}

fn triangle_path(g: &ColorbarGeometry) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(g.x, g.interior_top());
    pb.line_to(g.x + g.width / 2.0, g.y);
    pb.line_to(g.x + g.width, g.interior_top());
    pb.close();
    pb.finish()
}

/// Outline around the boxes and the triangle.
fn frame_path(g: &ColorbarGeometry) -> Option<tiny_skia::Path> {
    let bottom = g.y + g.height;
    let mut pb = PathBuilder::new();
    pb.move_to(g.x, bottom);
    pb.line_to(g.x, g.interior_top());
    pb.line_to(g.x + g.width / 2.0, g.y);
    pb.line_to(g.x + g.width, g.interior_top());
    pb.line_to(g.x + g.width, bottom);
    pb.close();
    pb.finish()
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}
