//! Mercator projection on the WGS84 ellipsoid.
//!
//! Mercator is conformal, so shapes stay undistorted locally, which is what
//! a regional precipitation map of mid-latitudes wants. The projection is
//! parameterized by the map extent:
//! - Central meridian: middle of the extent
//! - Projected origin: lower-left corner of the extent
//! - Units: meters on the ellipsoid, true scale at the equator
//!
//! [`PixelTransform`] then maps projected meters onto an image with the
//! origin in the upper-left corner and y growing downwards.

use crate::ProjectionError;
use precip_common::grid::normalize_longitude;
use precip_common::BoundingBox;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// WGS84 semi-major axis (meters)
const SEMI_MAJOR_AXIS: f64 = 6378137.0;
/// WGS84 first eccentricity
const ECCENTRICITY: f64 = 0.081_819_190_842_622;
/// Latitudes are clamped here before projecting.
pub const MAX_LATITUDE: f64 = 89.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    extent: BoundingBox,
    /// Central meridian in degrees
    lon0: f64,
    /// Projected lower-left corner (meters, relative to the central meridian)
    x_origin: f64,
    y_origin: f64,
    /// Projected size of the extent (meters)
    width_m: f64,
    height_m: f64,
}

impl Mercator {
    /// Mercator projection covering `extent`.
    pub fn new(extent: BoundingBox) -> Result<Self, ProjectionError> {
        if !extent.is_valid() {
            return Err(ProjectionError::InvalidExtent(format!("{:?}", extent)));
        }
        for lat in [extent.min_y, extent.max_y] {
            if lat.abs() > MAX_LATITUDE {
                return Err(ProjectionError::LatitudeOutOfRange(lat));
            }
        }
        if extent.width() > 360.0 {
            return Err(ProjectionError::InvalidExtent(format!(
                "longitude span {} exceeds 360 degrees",
                extent.width()
            )));
        }

        let lon0 = (extent.min_x + extent.max_x) / 2.0;
        let half_width = SEMI_MAJOR_AXIS * (extent.width() / 2.0).to_radians();
        let y_min = isometric_y(extent.min_y);
        let y_max = isometric_y(extent.max_y);

        Ok(Self {
            extent,
            lon0,
            x_origin: -half_width,
            y_origin: y_min,
            width_m: 2.0 * half_width,
            height_m: y_max - y_min,
        })
    }

    pub fn extent(&self) -> &BoundingBox {
        &self.extent
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.lon0
    }

    /// Projected `(width, height)` of the extent in meters.
    pub fn size_m(&self) -> (f64, f64) {
        (self.width_m, self.height_m)
    }

    /// Project geographic degrees to meters from the lower-left corner.
    ///
    /// Longitudes are taken relative to the central meridian, so inputs on
    /// either side of the antimeridian land next to each other.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let dlon = normalize_longitude(lon - self.lon0);
        let x = SEMI_MAJOR_AXIS * dlon.to_radians();
        let y = isometric_y(lat.clamp(-MAX_LATITUDE, MAX_LATITUDE));
        (x - self.x_origin, y - self.y_origin)
    }

    /// Inverse of [`project`](Self::project). Returns `(lon, lat)` in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let dlon = ((x + self.x_origin) / SEMI_MAJOR_AXIS).to_degrees();
        let lon = normalize_longitude(self.lon0 + dlon);

        // Iterate the conformal latitude towards the geodetic one.
        let t = (-(y + self.y_origin) / SEMI_MAJOR_AXIS).exp();
        let mut phi = FRAC_PI_2 - 2.0 * t.atan();
        for _ in 0..15 {
            let es = ECCENTRICITY * phi.sin();
            let next = FRAC_PI_2
                - 2.0 * (t * ((1.0 - es) / (1.0 + es)).powf(ECCENTRICITY / 2.0)).atan();
            if (next - phi).abs() < 1e-12 {
                phi = next;
                break;
            }
            phi = next;
        }

        (lon, phi.to_degrees())
    }

    /// Pixel transform for an image `width` pixels wide, with the height
    /// following the projected aspect ratio.
    pub fn pixel_transform(&self, width: u32) -> Result<PixelTransform, ProjectionError> {
        let height = (width as f64 * self.height_m / self.width_m).round() as u32;
        if width == 0 || height == 0 {
            return Err(ProjectionError::InvalidImageSize { width, height });
        }
        Ok(PixelTransform {
            projection: *self,
            width,
            height,
            scale_x: width as f64 / self.width_m,
            scale_y: height as f64 / self.height_m,
        })
    }
}

/// Mercator northing of a latitude, in meters from the equator.
fn isometric_y(lat_deg: f64) -> f64 {
    let phi = lat_deg.to_radians();
    let es = ECCENTRICITY * phi.sin();
    let ts = (FRAC_PI_4 + phi / 2.0).tan() * ((1.0 - es) / (1.0 + es)).powf(ECCENTRICITY / 2.0);
    SEMI_MAJOR_AXIS * ts.ln()
}

/// Maps geographic coordinates onto an image of fixed size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelTransform {
    projection: Mercator,
    width: u32,
    height: u32,
    /// Pixels per projected meter. The two only differ by the rounding
    /// of the image height.
    scale_x: f64,
    scale_y: f64,
}

impl PixelTransform {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn projection(&self) -> &Mercator {
        &self.projection
    }

    /// Pixel position of a geographic point; `(0, 0)` is the upper-left
    /// corner of the extent. Points outside the extent fall outside
    /// `[0, width] x [0, height]`.
    pub fn to_pixel(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = self.projection.project(lon, lat);
        (x * self.scale_x, self.height as f64 - y * self.scale_y)
    }

    /// Geographic `(lon, lat)` under a pixel position.
    pub fn to_geo(&self, px: f64, py: f64) -> (f64, f64) {
        let x = px / self.scale_x;
        let y = (self.height as f64 - py) / self.scale_y;
        self.projection.inverse(x, y)
    }
}
