//! Regular latitude/longitude grid geometry.

use serde::{Deserialize, Serialize};

/// Specification of a regular lat/lon grid as encoded in a GRIB2 file.
///
/// `dx`/`dy` are signed: they carry the direction in which the grid is
/// scanned, so `first_x + i * dx` is the longitude of column `i` in file
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of points along a parallel (longitude direction)
    pub nx: usize,
    /// Number of points along a meridian (latitude direction)
    pub ny: usize,
    /// Signed longitude increment in degrees
    pub dx: f64,
    /// Signed latitude increment in degrees
    pub dy: f64,
    /// Longitude of the first grid point
    pub first_x: f64,
    /// Latitude of the first grid point
    pub first_y: f64,
    /// Scan mode flags (determines how data is ordered)
    pub scan_mode: ScanMode,
}

impl GridSpec {
    /// Build a grid from GRIB2 template 3.0 values.
    ///
    /// Increments are given unsigned, as in the file; the direction comes
    /// from the scanning mode.
    pub fn from_corners(
        nx: usize,
        ny: usize,
        first_lon: f64,
        first_lat: f64,
        di: f64,
        dj: f64,
        scan_mode: ScanMode,
    ) -> Self {
        let dx = if scan_mode.i_negative { -di.abs() } else { di.abs() };
        let dy = if scan_mode.j_positive { dj.abs() } else { -dj.abs() };
        Self {
            nx,
            ny,
            dx,
            dy,
            first_x: first_lon,
            first_y: first_lat,
            scan_mode,
        }
    }

    /// Longitudes of the grid columns, normalized to [-180, 180).
    pub fn longitudes(&self) -> Vec<f64> {
        (0..self.nx)
            .map(|i| normalize_longitude(self.first_x + i as f64 * self.dx))
            .collect()
    }

    /// Latitudes of the grid rows, in scan order.
    pub fn latitudes(&self) -> Vec<f64> {
        (0..self.ny)
            .map(|j| self.first_y + j as f64 * self.dy)
            .collect()
    }

    /// Reorder values from file scan order into `[row][column]` order,
    /// where rows follow [`Self::latitudes`] and columns follow
    /// [`Self::longitudes`].
    pub fn to_row_major<T: Copy>(&self, values: &[T]) -> Vec<T> {
        let mut out = Vec::with_capacity(values.len());
        for j in 0..self.ny {
            for i in 0..self.nx {
                out.push(values[self.flat_index(i, j)]);
            }
        }
        out
    }

    /// Get the 1D array index of grid point `(i, j)` in file order.
    pub fn flat_index(&self, i: usize, j: usize) -> usize {
        self.scan_mode.flat_index(i, j, self.nx, self.ny)
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}

/// Map a longitude into [-180, 180).
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // In-range inputs come back bit-exact.
    if (wrapped - lon).abs() < 1e-9 {
        lon
    } else {
        wrapped
    }
}

/// Scan mode flags for grid data ordering.
///
/// Based on GRIB2 scanning mode (Flag Table 3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanMode {
    /// Points scan in -i direction (east to west)
    pub i_negative: bool,
    /// Points scan in +j direction (south to north)
    pub j_positive: bool,
    /// Adjacent points in j direction are consecutive
    pub j_consecutive: bool,
    /// Adjacent rows scan in opposite directions
    pub alternating_rows: bool,
}

impl ScanMode {
    /// Most common mode: rows go west to east, north to south.
    pub fn standard() -> Self {
        Self {
            i_negative: false,
            j_positive: false,
            j_consecutive: false,
            alternating_rows: false,
        }
    }

    /// Create from GRIB2 flag byte.
    pub fn from_grib2_flag(flag: u8) -> Self {
        Self {
            i_negative: (flag & 0x80) != 0,
            j_positive: (flag & 0x40) != 0,
            j_consecutive: (flag & 0x20) != 0,
            alternating_rows: (flag & 0x10) != 0,
        }
    }

    /// Calculate flat array index from 2D indices in scan order.
    pub fn flat_index(&self, i: usize, j: usize, nx: usize, ny: usize) -> usize {
        if self.j_consecutive {
            let j_eff = if self.alternating_rows && i % 2 == 1 {
                ny - 1 - j
            } else {
                j
            };
            i * ny + j_eff
        } else {
            let i_eff = if self.alternating_rows && j % 2 == 1 {
                nx - 1 - i
            } else {
                i
            };
            j * nx + i_eff
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn icon_d2() -> GridSpec {
        GridSpec::from_corners(
            1215,
            746,
            356.06,
            43.18,
            0.02,
            0.02,
            ScanMode::from_grib2_flag(0x40),
        )
    }

    #[test]
    fn test_scan_mode_from_grib2() {
        let mode = ScanMode::from_grib2_flag(0x40);
        assert!(!mode.i_negative);
        assert!(mode.j_positive);
        assert!(!mode.j_consecutive);
    }

    #[test]
    fn test_longitudes_wrap_across_greenwich() {
        let lons = icon_d2().longitudes();
        assert!((lons[0] - (-3.94)).abs() < 1e-6);
        assert!(lons.windows(2).all(|w| w[1] > w[0]));
        assert!((lons[1214] - 20.34).abs() < 1e-6);
    }

    #[test]
    fn test_latitudes_follow_scan_direction() {
        let lats = icon_d2().latitudes();
        assert!((lats[0] - 43.18).abs() < 1e-9);
        assert!((lats[745] - 58.08).abs() < 1e-6);

        let north_first =
            GridSpec::from_corners(3, 3, 0.0, 10.0, 1.0, 1.0, ScanMode::standard());
        assert_eq!(north_first.latitudes(), vec![10.0, 9.0, 8.0]);
    }

    #[test]
    fn test_to_row_major_column_order() {
        let grid = GridSpec::from_corners(
            3,
            2,
            0.0,
            0.0,
            1.0,
            1.0,
            ScanMode::from_grib2_flag(0x40 | 0x20),
        );
        // Column-major in file: (i0,j0), (i0,j1), (i1,j0), ...
        let file = [0, 3, 1, 4, 2, 5];
        assert_eq!(grid.to_row_major(&file), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_to_row_major_alternating_rows() {
        let grid = GridSpec::from_corners(
            3,
            2,
            0.0,
            0.0,
            1.0,
            1.0,
            ScanMode::from_grib2_flag(0x40 | 0x10),
        );
        let file = [0, 1, 2, 5, 4, 3];
        assert_eq!(grid.to_row_major(&file), vec![0, 1, 2, 3, 4, 5]);
    }
}
