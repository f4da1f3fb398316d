//! Filled contour bands.
//!
//! A [`ContourScale`] splits the value range at fixed levels. Every band
//! between two adjacent levels gets one color, taken from the colormap at
//! the band's midpoint. Values below the first level are not drawn; values
//! at or above the last level, and bands centered above `vmax`, take the
//! over color.
//!
//! [`render_bands`] fills an image by sampling the field bilinearly on its
//! own rectilinear mesh (one mesh point per grid point) and classifying
//! each pixel into a band. Pixels touching a missing value stay empty.

use crate::colormap::Colormap;
use crate::style::{LevelRange, Rgba};
use crate::{RenderError, RenderResult};
use precip_common::LabeledField;
use projection::PixelTransform;
use rayon::prelude::*;
use tiny_skia::{ColorU8, Pixmap, PremultipliedColorU8};

/// Where a value falls on a [`ContourScale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Below the first level; not drawn
    Below,
    /// Between `levels[i]` and `levels[i + 1]`
    Level(usize),
    /// At or above the last level
    Over,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContourScale {
    levels: Vec<f32>,
    band_colors: Vec<Rgba>,
    over: Rgba,
}

impl ContourScale {
    /// Build a scale from explicit levels (strictly increasing, at least two).
    pub fn new(
        levels: Vec<f32>,
        colormap: &Colormap,
        vmin: f32,
        vmax: f32,
        alpha: f32,
        over: [u8; 3],
    ) -> RenderResult<Self> {
        if levels.len() < 2 || levels.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(RenderError::InvalidStyle(format!(
                "contour levels must be increasing, got {:?}",
                levels
            )));
        }
        if !(vmin < vmax) {
            return Err(RenderError::InvalidStyle(format!(
                "vmin {} must be below vmax {}",
                vmin, vmax
            )));
        }
        let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        let over = [over[0], over[1], over[2], alpha];

        let band_colors = levels
            .windows(2)
            .map(|w| {
                let mid = (w[0] + w[1]) / 2.0;
                if mid > vmax {
                    over
                } else {
                    let [r, g, b] = colormap.sample((mid - vmin) / (vmax - vmin));
                    [r, g, b, alpha]
                }
            })
            .collect();

        Ok(Self {
            levels,
            band_colors,
            over,
        })
    }

    /// Levels `start, start + step, ...` below `stop`.
    pub fn arange(range: &LevelRange) -> Vec<f32> {
        if !(range.step > 0.0) {
            return Vec::new();
        }
        let count = ((range.stop - range.start) / range.step).ceil().max(0.0) as usize;
        (0..count)
            .map(|i| range.start + i as f32 * range.step)
            .collect()
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    /// Colors of the bands between adjacent levels.
    pub fn band_colors(&self) -> &[Rgba] {
        &self.band_colors
    }

    pub fn over_color(&self) -> Rgba {
        self.over
    }

    /// Band of a value; `None` for NaN.
    pub fn classify(&self, value: f32) -> Option<Band> {
        if value.is_nan() {
            return None;
        }
        let last = self.levels.len() - 1;
        if value < self.levels[0] {
            return Some(Band::Below);
        }
        if value >= self.levels[last] {
            return Some(Band::Over);
        }
        // First level strictly above the value closes its band.
        let upper = self.levels.partition_point(|&level| level <= value);
        Some(Band::Level(upper - 1))
    }

    /// Fill color of a value, if it is drawn at all.
    pub fn color_for(&self, value: f32) -> Option<Rgba> {
        match self.classify(value)? {
            Band::Below => None,
            Band::Level(i) => Some(self.band_colors[i]),
            Band::Over => Some(self.over),
        }
    }
}

/// Sorted pixel positions of one grid axis.
struct AxisLookup {
    /// `(pixel position, grid index)`, ascending by position
    positions: Vec<(f64, usize)>,
}

impl AxisLookup {
    fn new(positions: impl Iterator<Item = f64>) -> Self {
        let mut positions: Vec<(f64, usize)> = positions.enumerate().map(|(i, p)| (p, i)).collect();
        positions.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { positions }
    }

    /// Grid indices enclosing `p` and the weight of the upper one.
    fn locate(&self, p: f64) -> Option<(usize, usize, f64)> {
        let first = self.positions.first()?.0;
        let last = self.positions.last()?.0;
        if self.positions.len() < 2 || p < first || p > last {
            return None;
        }
        let upper = self
            .positions
            .partition_point(|&(pos, _)| pos <= p)
            .clamp(1, self.positions.len() - 1);
        let (p0, i0) = self.positions[upper - 1];
        let (p1, i1) = self.positions[upper];
        let span = p1 - p0;
        let t = if span > 0.0 { (p - p0) / span } else { 0.0 };
        Some((i0, i1, t))
    }
}

/// Rasterize the filled contour bands of a single-layer field onto a
/// transparent pixmap the size of `transform`.
pub fn render_bands(
    field: &LabeledField,
    transform: &PixelTransform,
    scale: &ContourScale,
) -> RenderResult<Pixmap> {
    if field.steps().is_some() {
        return Err(RenderError::NotSingleLayer);
    }
    // Bands are interpolated between neighbouring points, so both axes need two.
    let (nlat, nlon) = field.layer_shape();
    if nlat < 2 || nlon < 2 || field.values().len() != nlat * nlon {
        return Err(RenderError::MeshMismatch {
            values: field.values().len(),
            lats: nlat,
            lons: nlon,
        });
    }

    let (width, height) = (transform.width(), transform.height());
    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Canvas { width, height })?;

    // Mercator keeps meridians vertical and parallels horizontal, so the
    // mesh is rectilinear in pixel space.
    let reference_lat = field.latitudes().first().copied().unwrap_or_default();
    let reference_lon = field.longitudes().first().copied().unwrap_or_default();
    let columns = AxisLookup::new(
        field
            .longitudes()
            .iter()
            .map(|&lon| transform.to_pixel(lon, reference_lat).0),
    );
    let rows = AxisLookup::new(
        field
            .latitudes()
            .iter()
            .map(|&lat| transform.to_pixel(reference_lon, lat).1),
    );

    let values = field.values();
    let sample = |row: usize, col: usize| values[row * nlon + col];

    pixmap
        .pixels_mut()
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, line)| {
            let Some((r0, r1, ty)) = rows.locate(y as f64 + 0.5) else {
                return;
            };
            for (x, pixel) in line.iter_mut().enumerate() {
                let Some((c0, c1, tx)) = columns.locate(x as f64 + 0.5) else {
                    continue;
                };
                let top = lerp(sample(r0, c0), sample(r0, c1), tx);
                let bottom = lerp(sample(r1, c0), sample(r1, c1), tx);
                let value = lerp(top, bottom, ty);
                if let Some(color) = scale.color_for(value) {
                    *pixel = premultiply(color);
                }
            }
        });

    Ok(pixmap)
}

fn lerp(a: f32, b: f32, t: f64) -> f32 {
    // NaN in either corner poisons the result.
    (a as f64 + (b as f64 - a as f64) * t) as f32
}

pub(crate) fn premultiply(color: Rgba) -> PremultipliedColorU8 {
    ColorU8::from_rgba(color[0], color[1], color[2], color[3]).premultiply()
}

#[cfg(test)]
mod tests {
    use super::*;
    use precip_common::BoundingBox;
    use projection::Mercator;

    fn default_scale() -> ContourScale {
        let levels = ContourScale::arange(&LevelRange::default());
        let cmap = Colormap::by_name("viridis_r").unwrap();
        ContourScale::new(levels, &cmap, 1.0, 50.0, 0.5, [255, 0, 0]).unwrap()
    }

    #[test]
    fn test_arange_levels() {
        assert_eq!(
            ContourScale::arange(&LevelRange::default()),
            vec![1.0, 8.0, 15.0, 22.0, 29.0, 36.0, 43.0, 50.0, 57.0]
        );
        let empty = LevelRange {
            start: 1.0,
            stop: 1.0,
            step: 7.0,
        };
        assert!(ContourScale::arange(&empty).is_empty());
    }

    #[test]
    fn test_classify() {
        let scale = default_scale();
        assert_eq!(scale.classify(0.0), Some(Band::Below));
        assert_eq!(scale.classify(0.99), Some(Band::Below));
        assert_eq!(scale.classify(1.0), Some(Band::Level(0)));
        assert_eq!(scale.classify(7.99), Some(Band::Level(0)));
        assert_eq!(scale.classify(8.0), Some(Band::Level(1)));
        assert_eq!(scale.classify(56.9), Some(Band::Level(7)));
        assert_eq!(scale.classify(57.0), Some(Band::Over));
        assert_eq!(scale.classify(f32::NAN), None);
    }

    #[test]
    fn test_band_colors() {
        let scale = default_scale();
        let colors = scale.band_colors();
        assert_eq!(colors.len(), 8);
        // Reversed viridis: light yellow for light rain
        assert!(colors[0][0] > 200 && colors[0][1] > 200);
        assert!(colors.iter().all(|c| c[3] == 128));
        // Band 50..57 is centered above vmax
        assert_eq!(colors[7], [255, 0, 0, 128]);
        assert_eq!(scale.color_for(100.0), Some([255, 0, 0, 128]));
        assert_eq!(scale.color_for(0.5), None);
    }

    #[test]
    fn test_invalid_levels() {
        let cmap = Colormap::by_name("viridis").unwrap();
        assert!(ContourScale::new(vec![1.0], &cmap, 1.0, 50.0, 0.5, [255, 0, 0]).is_err());
        assert!(ContourScale::new(vec![2.0, 1.0], &cmap, 1.0, 50.0, 0.5, [255, 0, 0]).is_err());
        assert!(ContourScale::new(vec![1.0, 2.0], &cmap, 5.0, 5.0, 0.5, [255, 0, 0]).is_err());
    }

    fn field(values: Vec<f32>) -> LabeledField {
        let lats: Vec<f64> = (47..=56).rev().map(f64::from).collect();
        let lons: Vec<f64> = (6..=15).map(f64::from).collect();
        LabeledField::new("tp", lats, lons, values).unwrap()
    }

    fn transform() -> PixelTransform {
        Mercator::new(BoundingBox::germany())
            .unwrap()
            .pixel_transform(90)
            .unwrap()
    }

    #[test]
    fn test_zero_field_is_transparent() {
        let pixmap = render_bands(&field(vec![0.0; 100]), &transform(), &default_scale()).unwrap();
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn test_constant_field_fills_map() {
        let pixmap = render_bands(&field(vec![10.0; 100]), &transform(), &default_scale()).unwrap();
        let expected = premultiply(default_scale().band_colors()[1]);
        let center = pixmap.pixel(45, pixmap.height() / 2).unwrap();
        assert_eq!(center, expected);
    }

    #[test]
    fn test_missing_values_stay_empty() {
        let mut values = vec![10.0; 100];
        values[0] = f32::NAN;
        let pixmap = render_bands(&field(values), &transform(), &default_scale()).unwrap();
        // Upper-left corner cell touches the missing point
        assert_eq!(pixmap.pixel(1, 1).unwrap().alpha(), 0);
        assert!(pixmap.pixel(80, 80).unwrap().alpha() > 0);
    }

    #[test]
    fn test_single_row_rejected() {
        let lons: Vec<f64> = (6..=15).map(f64::from).collect();
        let row = LabeledField::new("tp", vec![51.0], lons, vec![30.0; 10]).unwrap();
        assert!(matches!(
            render_bands(&row, &transform(), &default_scale()),
            Err(RenderError::MeshMismatch { lats: 1, lons: 10, .. })
        ));
    }

    #[test]
    fn test_step_axis_rejected() {
        let field = LabeledField::with_steps(
            "tp",
            vec![chrono::Duration::hours(1)],
            vec![50.0],
            vec![7.0],
            vec![1.0],
        )
        .unwrap();
        assert!(matches!(
            render_bands(&field, &transform(), &default_scale()),
            Err(RenderError::NotSingleLayer)
        ));
    }
}
