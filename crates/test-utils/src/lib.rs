//! Fixtures for the precip-maps workspace tests.
//!
//! - [`Grib2Builder`] writes small synthetic GRIB2 messages
//! - [`write_polygon_shapefile`] writes basemap shapefiles
//! - grid generators and bzip2/gzip helpers
//! - [`assert_approx_eq!`] and [`assert_coords_approx_eq!`]

pub mod compression;
pub mod generators;
pub mod grib;
pub mod shapes;

pub use compression::*;
pub use generators::*;
pub use grib::Grib2Builder;
pub use shapes::*;

/// Assert two numbers differ by at most `epsilon`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// [`assert_approx_eq!`] on both components of a coordinate pair.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_eq_within_epsilon() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_coords_approx_eq!((6.0, 47.0), (6.0000001, 46.9999999), 1e-6);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_approx_eq_outside_epsilon() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_approx_eq_nan() {
        assert_approx_eq!(f64::NAN, 1.0, 0.001);
    }
}
