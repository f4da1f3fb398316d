//! Style configuration for precipitation maps.
//!
//! Sizes of lines and text are given in typographic points and converted to
//! pixels through the configured dpi, so a map keeps its look when rendered
//! at a different resolution.

use crate::{RenderError, RenderResult};
use projection::BoundaryResolution;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Straight (non-premultiplied) RGBA color.
pub type Rgba = [u8; 4];

/// Contour levels as `start, start + step, ...` below `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LevelRange {
    pub start: f32,
    pub stop: f32,
    pub step: f32,
}

impl Default for LevelRange {
    fn default() -> Self {
        Self {
            start: 1.0,
            stop: 60.0,
            step: 7.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MapStyle {
    /// Width of the map frame in pixels
    pub map_width: u32,
    pub dpi: u32,
    pub boundary_resolution: BoundaryResolution,
    /// Figure background around the map frame
    pub background: String,
    pub continent_color: String,
    pub border_color: String,
    /// Country border width in points
    pub border_width: f32,
    pub region_outline_color: String,
    /// Region outline width in points
    pub region_outline_width: f32,
    pub levels: LevelRange,
    /// Value mapped to the low end of the colormap
    pub vmin: f32,
    /// Bands centered above this value take the over color
    pub vmax: f32,
    pub colormap: String,
    pub over_color: String,
    /// Opacity of the contour bands
    pub fill_alpha: f32,
    pub text_color: String,
    /// Title size in points
    pub title_size: f32,
    /// Caption and legend label size in points
    pub text_size: f32,
    /// Land polygons and country borders
    pub countries_shapefile: PathBuf,
    /// Administrative regions outlined on top of the map
    pub region_shapefile: PathBuf,
    /// Caption lines drawn in the lower-left corner of the map
    pub attribution: Vec<String>,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            map_width: 2700,
            dpi: 300,
            boundary_resolution: BoundaryResolution::High,
            background: "#232323".to_string(),
            continent_color: "#232323".to_string(),
            border_color: "#ffffff".to_string(),
            border_width: 1.25,
            region_outline_color: "#ffffff".to_string(),
            region_outline_width: 0.5,
            levels: LevelRange::default(),
            vmin: 1.0,
            vmax: 50.0,
            colormap: "viridis_r".to_string(),
            over_color: "red".to_string(),
            fill_alpha: 0.5,
            text_color: "#ffffff".to_string(),
            title_size: 12.0,
            text_size: 10.0,
            countries_shapefile: PathBuf::from("ressources/ne_10m_admin_0_countries.shp"),
            region_shapefile: PathBuf::from("ressources/DEU_adm1.shp"),
            attribution: vec![
                "Source: DWD Open Data server, ICON D2 Model".to_string(),
                "Link: https://opendata.dwd.de/weather/nwp/icon-d2/grib/12/tot_prec/".to_string(),
                "Copyright: Janik Klauenberg".to_string(),
            ],
        }
    }
}

impl MapStyle {
    /// Convert a size in points to pixels at the configured dpi.
    pub fn points_to_pixels(&self, points: f32) -> f32 {
        points * self.dpi as f32 / 72.0
    }

    /// Resolve every configured color, failing on the first invalid one.
    pub fn colors(&self) -> RenderResult<StyleColors> {
        Ok(StyleColors {
            background: opaque(&self.background)?,
            continent: opaque(&self.continent_color)?,
            border: opaque(&self.border_color)?,
            region_outline: opaque(&self.region_outline_color)?,
            over: opaque(&self.over_color)?,
            text: opaque(&self.text_color)?,
        })
    }
}

/// Resolved colors of a [`MapStyle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleColors {
    pub background: Rgba,
    pub continent: Rgba,
    pub border: Rgba,
    pub region_outline: Rgba,
    pub over: Rgba,
    pub text: Rgba,
}

fn opaque(color: &str) -> RenderResult<Rgba> {
    let [r, g, b] =
        parse_color(color).ok_or_else(|| RenderError::InvalidStyle(format!("color '{}'", color)))?;
    Ok([r, g, b, 255])
}

/// Parse `#rrggbb`, `#rgb` or one of a few color names to RGB.
pub fn parse_color(color: &str) -> Option<[u8; 3]> {
    let color = color.trim();
    match color.to_ascii_lowercase().as_str() {
        "red" => return Some([255, 0, 0]),
        "white" => return Some([255, 255, 255]),
        "black" => return Some([0, 0, 0]),
        "green" => return Some([0, 128, 0]),
        "blue" => return Some([0, 0, 255]),
        "gray" | "grey" => return Some([128, 128, 128]),
        _ => {}
    }

    let hex = color.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some([r, g, b])
        }
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some([digit(0)?, digit(1)?, digit(2)?])
        }
        _ => None,
    }
}
