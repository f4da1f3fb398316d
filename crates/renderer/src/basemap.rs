//! Vector basemap layers: land fill, country borders and region outlines.

use crate::shp::{read_shapes, Shape, ShapeKind};
use crate::style::Rgba;
use crate::RenderResult;
use precip_common::BoundingBox;
use projection::{BoundaryResolution, PixelTransform};
use std::path::Path;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::debug;

/// Shapes further than this (degrees) outside the map are dropped on load.
const EXTENT_MARGIN: f64 = 1.0;

#[derive(Debug, Clone, Default)]
pub struct Basemap {
    /// Country polygons, filled as land and stroked as borders
    countries: Vec<Shape>,
    /// Administrative region outlines
    regions: Vec<Shape>,
}

impl Basemap {
    /// Load both shapefiles, keeping shapes near `extent` and simplifying
    /// them to `resolution`.
    pub fn load(
        countries: &Path,
        regions: &Path,
        extent: &BoundingBox,
        resolution: BoundaryResolution,
    ) -> RenderResult<Self> {
        let countries = prepare(read_shapes(countries)?, extent, resolution);
        let regions = prepare(read_shapes(regions)?, extent, resolution);
        debug!(
            countries = countries.len(),
            regions = regions.len(),
            %resolution,
            "Loaded basemap"
        );
        Ok(Self { countries, regions })
    }

    /// Basemap from already loaded shapes.
    pub fn from_shapes(countries: Vec<Shape>, regions: Vec<Shape>) -> Self {
        Self { countries, regions }
    }

    pub fn countries(&self) -> &[Shape] {
        &self.countries
    }

    pub fn regions(&self) -> &[Shape] {
        &self.regions
    }

    /// Fill country polygons as land.
    pub fn fill_continents(&self, pixmap: &mut Pixmap, transform: &PixelTransform, color: Rgba) {
        let paint = paint(color);
        for shape in self.countries.iter().filter(|s| s.kind == ShapeKind::Polygon) {
            // Even-odd keeps lakes and enclaves open.
            if let Some(path) = build_path(&shape.parts, transform, true) {
                pixmap.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
            }
        }
    }

    /// Stroke country outlines.
    pub fn draw_borders(&self, pixmap: &mut Pixmap, transform: &PixelTransform, color: Rgba, width: f32) {
        stroke_shapes(&self.countries, pixmap, transform, color, width);
    }

    /// Stroke administrative region outlines.
    pub fn draw_regions(&self, pixmap: &mut Pixmap, transform: &PixelTransform, color: Rgba, width: f32) {
        stroke_shapes(&self.regions, pixmap, transform, color, width);
    }
}

fn prepare(shapes: Vec<Shape>, extent: &BoundingBox, resolution: BoundaryResolution) -> Vec<Shape> {
    let window = BoundingBox::new(
        extent.min_x - EXTENT_MARGIN,
        extent.min_y - EXTENT_MARGIN,
        extent.max_x + EXTENT_MARGIN,
        extent.max_y + EXTENT_MARGIN,
    );
    shapes
        .into_iter()
        .filter(|shape| touches(&shape.bbox, &window))
        .map(|shape| {
            let parts = shape
                .parts
                .iter()
                .map(|part| resolution.simplify(part))
                .filter(|part| part.len() >= 2)
                .collect();
            Shape { parts, ..shape }
        })
        .collect()
}

/// Like `intersects`, but boxes that only share an edge still count.
fn touches(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.min_x <= b.max_x && a.max_x >= b.min_x && a.min_y <= b.max_y && a.max_y >= b.min_y
}

fn stroke_shapes(
    shapes: &[Shape],
    pixmap: &mut Pixmap,
    transform: &PixelTransform,
    color: Rgba,
    width: f32,
) {
    let paint = paint(color);
    let mut stroke = Stroke::default();
    stroke.width = width.max(0.1);
    stroke.line_cap = LineCap::Round;
    stroke.line_join = LineJoin::Round;

    for shape in shapes {
        let closed = shape.kind == ShapeKind::Polygon;
        if let Some(path) = build_path(&shape.parts, transform, closed) {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

fn build_path(
    parts: &[Vec<(f64, f64)>],
    transform: &PixelTransform,
    closed: bool,
) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for part in parts.iter().filter(|p| p.len() >= 2) {
        for (i, &(lon, lat)) in part.iter().enumerate() {
            let (x, y) = transform.to_pixel(lon, lat);
            if i == 0 {
                pb.move_to(x as f32, y as f32);
            } else {
                pb.line_to(x as f32, y as f32);
            }
        }
        if closed {
            pb.close();
        }
    }
    pb.finish()
}
