//! Precipitation map rendering.
//!
//! Turns a cropped precipitation field into a georeferenced PNG:
//! - Filled contour bands on a fixed level scale (`contour`)
//! - Basemap land fill, country borders and region outlines (`basemap`, `shp`)
//! - Colorbar, title and attribution caption (`legend`, `text`)
//! - PNG encoding with resolution metadata and write-once output (`png`, `writer`)
//!
//! [`MapRenderer`] composes all of them.

pub mod basemap;
pub mod colormap;
pub mod contour;
pub mod error;
pub mod legend;
pub mod map;
pub mod png;
pub mod shp;
pub mod style;
pub mod text;
pub mod writer;

pub use basemap::Basemap;
pub use colormap::Colormap;
pub use contour::{render_bands, Band, ContourScale};
pub use error::{RenderError, RenderResult};
pub use map::{MapRenderer, RenderedImage};
pub use style::{LevelRange, MapStyle};
