//! Map composition.
//!
//! Layers, bottom to top:
//! 1. Figure background (outside the map frame)
//! 2. Continent fill
//! 3. Filled contour bands
//! 4. Country borders
//! 5. Region outlines
//! 6. Colorbar, title, caption and tick labels
//!
//! Inside the map frame, pixels not covered by land or contours stay
//! transparent. The canvas is sized to the bounding box of all content,
//! without padding.

use crate::basemap::Basemap;
use crate::colormap::Colormap;
use crate::contour::{render_bands, ContourScale};
use crate::legend::{draw_colorbar, format_level, ColorbarGeometry};
use crate::png::encode_png;
use crate::style::{MapStyle, Rgba, StyleColors};
use crate::text::{map_title, TextRenderer};
use crate::writer::write_atomic;
use crate::{RenderError, RenderResult};
use image::RgbaImage;
use precip_common::{BoundingBox, ForecastWindow, LabeledField};
use projection::{Mercator, PixelTransform};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tiny_skia::{BlendMode, Color, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};
use tracing::{debug, info};

/// Title padding above the map frame, in points.
const TITLE_PAD: f32 = 6.0;
/// Gap between map frame and colorbar, as a fraction of the map width.
const COLORBAR_GAP: f32 = 0.05;
/// Colorbar height / width.
const COLORBAR_ASPECT: f32 = 20.0;
/// Tick length and label gap, in points.
const TICK_LENGTH: f32 = 3.5;
/// Frame and tick line width, in points.
const FRAME_WIDTH: f32 = 0.8;
/// Caption inset from the map frame corner, in points.
const CAPTION_INSET: f32 = 2.0;

/// A finished map as straight RGBA pixels.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub dpi: u32,
    /// `(x, y, width, height)` of the map frame on the canvas
    pub map_frame: (u32, u32, u32, u32),
}

impl RenderedImage {
    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[at..at + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        encode_png(
            &self.pixels,
            self.width as usize,
            self.height as usize,
            Some(self.dpi),
        )
        .map_err(RenderError::Encode)
    }
}

pub struct MapRenderer {
    style: MapStyle,
    colors: StyleColors,
    scale: ContourScale,
    region: BoundingBox,
    transform: PixelTransform,
    text: TextRenderer,
    basemap: Option<Basemap>,
}

impl MapRenderer {
    /// Renderer for maps of `region`. Shapefiles are read when rendering.
    pub fn new(style: MapStyle, region: BoundingBox) -> RenderResult<Self> {
        let colors = style.colors()?;
        let colormap = Colormap::by_name(&style.colormap)?;
        let [r, g, b, _] = colors.over;
        let scale = ContourScale::new(
            ContourScale::arange(&style.levels),
            &colormap,
            style.vmin,
            style.vmax,
            style.fill_alpha,
            [r, g, b],
        )?;
        let transform = Mercator::new(region)?.pixel_transform(style.map_width)?;
        let text = TextRenderer::new()?;

        Ok(Self {
            style,
            colors,
            scale,
            region,
            transform,
            text,
            basemap: None,
        })
    }

    /// Use preloaded basemap shapes instead of reading the shapefiles.
    pub fn with_basemap(mut self, basemap: Basemap) -> Self {
        self.basemap = Some(basemap);
        self
    }

    pub fn style(&self) -> &MapStyle {
        &self.style
    }

    pub fn scale(&self) -> &ContourScale {
        &self.scale
    }

    pub fn transform(&self) -> &PixelTransform {
        &self.transform
    }

    fn basemap(&self) -> RenderResult<Cow<'_, Basemap>> {
        match &self.basemap {
            Some(basemap) => Ok(Cow::Borrowed(basemap)),
            None => Basemap::load(
                &self.style.countries_shapefile,
                &self.style.region_shapefile,
                &self.region,
                self.style.boundary_resolution,
            )
            .map(Cow::Owned),
        }
    }

    /// Render a single-layer field for `window`.
    pub fn render(&self, field: &LabeledField, window: &ForecastWindow) -> RenderResult<RenderedImage> {
        if field.steps().is_some() {
            return Err(RenderError::NotSingleLayer);
        }
        let (nlat, nlon) = field.layer_shape();
        if nlat < 2 || nlon < 2 || field.values().len() != nlat * nlon {
            return Err(RenderError::MeshMismatch {
                values: field.values().len(),
                lats: nlat,
                lons: nlon,
            });
        }

        let basemap = self.basemap()?;
        let pt = |points: f32| self.style.points_to_pixels(points);
        let title_size = pt(self.style.title_size);
        let text_size = pt(self.style.text_size);

        // Layout
        let title = map_title(window);
        let (title_w, title_h) = self.text.measure(&title, title_size);
        let (map_w, map_h) = (self.transform.width(), self.transform.height());

        let labels: Vec<String> = self.scale.levels().iter().map(|&l| format_level(l)).collect();
        let label_w = labels
            .iter()
            .map(|label| self.text.measure(label, text_size).0)
            .max()
            .unwrap_or(0);
        let label_h = text_size.ceil() as u32;

        let cbar_gap = (map_w as f32 * COLORBAR_GAP).round() as u32;
        let cbar_w = (map_h as f32 / COLORBAR_ASPECT).round().max(1.0) as u32;
        let tick_len = pt(TICK_LENGTH).ceil() as u32;
        let right_extent = map_w + cbar_gap + cbar_w + 2 * tick_len + label_w;

        let map_x = (title_w.saturating_sub(map_w) + 1) / 2;
        let title_x = (map_x + map_w / 2).saturating_sub(title_w / 2);
        let map_y = title_h + pt(TITLE_PAD).round() as u32;

        let caption = &self.style.attribution;
        let (caption_w, caption_h) = self.text.measure_lines(caption, text_size);
        let inset = pt(CAPTION_INSET).round() as u32;

        let width = (map_x + right_extent)
            .max(title_x + title_w)
            .max(map_x + inset + caption_w);
        let height = map_y + map_h + (label_h + 1) / 2;

        // Raster layers
        let mut canvas = Pixmap::new(width, height).ok_or(RenderError::Canvas { width, height })?;
        canvas.fill(color(self.colors.background));

        let mut map = Pixmap::new(map_w, map_h).ok_or(RenderError::Canvas {
            width: map_w,
            height: map_h,
        })?;
        basemap.fill_continents(&mut map, &self.transform, self.colors.continent);
        let bands = render_bands(field, &self.transform, &self.scale)?;
        map.draw_pixmap(
            0,
            0,
            bands.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        basemap.draw_borders(
            &mut map,
            &self.transform,
            self.colors.border,
            pt(self.style.border_width),
        );
        basemap.draw_regions(
            &mut map,
            &self.transform,
            self.colors.region_outline,
            pt(self.style.region_outline_width),
        );

        let replace = PixmapPaint {
            blend_mode: BlendMode::Source,
            ..PixmapPaint::default()
        };
        canvas.draw_pixmap(
            map_x as i32,
            map_y as i32,
            map.as_ref(),
            &replace,
            Transform::identity(),
            None,
        );

        let geometry = ColorbarGeometry {
            x: (map_x + map_w + cbar_gap) as f32,
            y: map_y as f32,
            width: cbar_w as f32,
            height: map_h as f32,
        };
        let ticks = draw_colorbar(
            &mut canvas,
            &self.scale,
            &geometry,
            self.colors.text,
            pt(FRAME_WIDTH),
        );
        let tick_start = geometry.x + geometry.width;
        draw_tick_marks(
            &mut canvas,
            ticks.iter().map(|t| t.y),
            tick_start,
            tick_len as f32,
            self.colors.text,
            pt(FRAME_WIDTH),
        );

        // Text
        let mut image = to_rgba_image(&canvas);
        self.text
            .draw(&mut image, &title, title_x as i32, 0, title_size, self.colors.text);

        let caption_y = (map_y + map_h).saturating_sub(caption_h + inset).max(map_y);
        self.text.draw_lines(
            &mut image,
            caption,
            (map_x + inset) as i32,
            caption_y as i32,
            text_size,
            self.colors.text,
        );

        let label_x = (tick_start as u32 + 2 * tick_len) as i32;
        for tick in &ticks {
            let y = tick.y.round() as i32 - (label_h / 2) as i32;
            self.text
                .draw(&mut image, &tick.label, label_x, y, text_size, self.colors.text);
        }

        debug!(width, height, map_w, map_h, %window, "Rendered map");
        Ok(RenderedImage {
            width,
            height,
            pixels: image.into_raw(),
            dpi: self.style.dpi,
            map_frame: (map_x, map_y, map_w, map_h),
        })
    }

    /// Render and write `{valid_from}_{valid_to}.png` into `output_dir`.
    ///
    /// The image is fully encoded before anything touches the disk.
    pub fn render_to_file(
        &self,
        field: &LabeledField,
        window: &ForecastWindow,
        output_dir: &Path,
    ) -> RenderResult<PathBuf> {
        let image = self.render(field, window)?;
        let png = image.encode_png()?;
        let path = output_dir.join(format!("{}.png", window.file_stem()));
        write_atomic(&path, &png)?;
        info!(path = %path.display(), bytes = png.len(), "Wrote map image");
        Ok(path)
    }
}

fn color(c: Rgba) -> Color {
    Color::from_rgba8(c[0], c[1], c[2], c[3])
}

fn draw_tick_marks(
    pixmap: &mut Pixmap,
    ys: impl Iterator<Item = f32>,
    x: f32,
    length: f32,
    c: Rgba,
    width: f32,
) {
    let mut pb = PathBuilder::new();
    for y in ys {
        pb.move_to(x, y);
        pb.line_to(x + length, y);
    }
    let Some(path) = pb.finish() else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(c[0], c[1], c[2], c[3]);
    let mut stroke = Stroke::default();
    stroke.width = width.max(0.1);
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        dst.0 = if src.alpha() == 0 {
            [0, 0, 0, 0]
        } else {
            let c = src.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        };
    }
    image
}
